//! The secret-code blob that protects the RSA container passphrase.
//!
//! On disk the blob is `ciphertext \n tag \n nonce`. Tag and nonce have fixed
//! sizes, so the file is split from the end: the ciphertext may itself contain
//! newline bytes without confusing the parser.

use crate::error::{CryptoError, CryptoResult};
use crate::field::{self, EncryptedField, NONCE_SIZE, TAG_SIZE};
use crate::key::BootstrapKey;
use zeroize::Zeroizing;

const SEPARATOR: u8 = b'\n';

/// Minimum encoded size: one ciphertext byte, two separators, tag and nonce.
const MIN_ENCODED_LEN: usize = 1 + 1 + TAG_SIZE + 1 + NONCE_SIZE;

/// Parsed secret-code file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretCodeBlob {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl SecretCodeBlob {
    /// Splits raw file bytes into `[ciphertext, tag, nonce]`.
    ///
    /// The file must hold exactly three segments: a trailing newline after
    /// the nonce is rejected like any other extra segment.
    pub fn parse(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < MIN_ENCODED_LEN {
            return Err(CryptoError::KeyImport(format!(
                "secret code too short: {} bytes",
                bytes.len()
            )));
        }

        let nonce_start = bytes.len() - NONCE_SIZE;
        let tag_start = nonce_start - 1 - TAG_SIZE;
        let ciphertext_end = tag_start - 1;

        if bytes[nonce_start - 1] != SEPARATOR || bytes[ciphertext_end] != SEPARATOR {
            return Err(CryptoError::KeyImport(
                "secret code is not three newline-separated segments".to_string(),
            ));
        }

        Ok(Self {
            ciphertext: bytes[..ciphertext_end].to_vec(),
            tag: bytes[tag_start..nonce_start - 1].to_vec(),
            nonce: bytes[nonce_start..].to_vec(),
        })
    }

    /// Encodes the blob in the on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(self.ciphertext.len() + self.tag.len() + self.nonce.len() + 2);
        out.extend_from_slice(&self.ciphertext);
        out.push(SEPARATOR);
        out.extend_from_slice(&self.tag);
        out.push(SEPARATOR);
        out.extend_from_slice(&self.nonce);
        out
    }

    /// Encrypts a passphrase under the bootstrap key.
    ///
    /// This is the out-of-band provisioning step; request paths only ever
    /// call [`SecretCodeBlob::open`].
    pub fn seal(passphrase: &[u8], bootstrap: &BootstrapKey) -> CryptoResult<Self> {
        if passphrase.is_empty() {
            return Err(CryptoError::InvalidArgument(
                "secret code passphrase must not be empty".to_string(),
            ));
        }
        let sealed = field::encrypt_field(bootstrap.key(), passphrase)?;
        Ok(Self {
            ciphertext: sealed.ciphertext,
            tag: sealed.tag,
            nonce: sealed.nonce,
        })
    }

    /// Recovers the passphrase, verifying the stored tag.
    pub fn open(&self, bootstrap: &BootstrapKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
        let sealed = EncryptedField {
            ciphertext: self.ciphertext.clone(),
            tag: self.tag.clone(),
            nonce: self.nonce.clone(),
        };
        match field::decrypt_field(bootstrap.key(), &sealed) {
            Ok(passphrase) if passphrase.is_empty() => Err(CryptoError::KeyImport(
                "secret code decrypted to an empty passphrase".to_string(),
            )),
            Ok(passphrase) => Ok(Zeroizing::new(passphrase)),
            Err(CryptoError::DataCorrupted) => Err(CryptoError::KeyImport(
                "secret code failed authentication".to_string(),
            )),
            Err(e) => Err(CryptoError::KeyImport(format!("secret code unreadable: {e}"))),
        }
    }
}
