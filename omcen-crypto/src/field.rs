//! Field-level authenticated encryption (AES-256-EAX).
//!
//! Each sensitive value is stored as an independent triple of ciphertext,
//! tag and nonce. The three columns form one unit: a reader must never
//! combine a ciphertext with a tag or nonce from a different write.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use aes::Aes256;
use eax::Eax;
use eax::aead::{AeadInPlace, KeyInit, Nonce, Tag};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Nonce size in bytes (EAX default for a 128-bit block cipher).
pub const NONCE_SIZE: usize = 16;

type Aes256Eax = Eax<Aes256>;

/// One encrypted field: ciphertext plus detached tag and nonce.
///
/// An empty field (all three sequences empty) stands for an absent value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl EncryptedField {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Length of the ciphertext in bytes.
    pub fn len(&self) -> usize {
        self.ciphertext.len()
    }

    /// Rebuilds a field from three nullable storage columns.
    ///
    /// The columns are an all-or-nothing group: either every column holds
    /// bytes or none does. A partial triple is rejected.
    pub fn from_columns(
        ciphertext: Option<Vec<u8>>,
        tag: Option<Vec<u8>>,
        nonce: Option<Vec<u8>>,
    ) -> CryptoResult<Self> {
        let ciphertext = ciphertext.unwrap_or_default();
        let tag = tag.unwrap_or_default();
        let nonce = nonce.unwrap_or_default();

        let present = [&ciphertext, &tag, &nonce]
            .iter()
            .filter(|c| !c.is_empty())
            .count();
        match present {
            0 => Ok(Self::empty()),
            3 => {
                check_tag_and_nonce(&tag, &nonce)?;
                Ok(Self {
                    ciphertext,
                    tag,
                    nonce,
                })
            }
            _ => Err(CryptoError::InvalidArgument(format!(
                "incomplete field triple ({present} of 3 columns present)"
            ))),
        }
    }

    /// Splits the field into nullable columns (`None` for an empty field).
    pub fn into_columns(self) -> (Option<Vec<u8>>, Option<Vec<u8>>, Option<Vec<u8>>) {
        if self.is_empty() {
            return (None, None, None);
        }
        (Some(self.ciphertext), Some(self.tag), Some(self.nonce))
    }
}

/// Encrypts `plaintext` under `key` with a freshly drawn nonce.
///
/// Empty input returns an empty field without touching the RNG or the cipher.
pub fn encrypt_field(key: &SymmetricKey, plaintext: &[u8]) -> CryptoResult<EncryptedField> {
    if plaintext.is_empty() {
        return Ok(EncryptedField::empty());
    }

    let cipher = Aes256Eax::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("cipher setup failed: {e}")))?;

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<Aes256Eax>::from_slice(&nonce), b"", &mut buffer)
        .map_err(|e| CryptoError::Encryption(format!("encryption failed: {e}")))?;

    Ok(EncryptedField {
        ciphertext: buffer,
        tag: tag.to_vec(),
        nonce: nonce.to_vec(),
    })
}

/// Decrypts a field and verifies its tag.
pub fn decrypt_field(key: &SymmetricKey, field: &EncryptedField) -> CryptoResult<Vec<u8>> {
    decrypt_parts(key, &field.ciphertext, &field.tag, &field.nonce)
}

/// Decrypts detached parts and verifies the tag.
///
/// Empty ciphertext returns empty plaintext whatever tag and nonce hold.
/// Tag and nonce lengths are checked before the cipher runs; a tag that does
/// not verify yields [`CryptoError::DataCorrupted`].
pub fn decrypt_parts(
    key: &SymmetricKey,
    ciphertext: &[u8],
    tag: &[u8],
    nonce: &[u8],
) -> CryptoResult<Vec<u8>> {
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    check_tag_and_nonce(tag, nonce)?;

    let cipher = Aes256Eax::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Decryption(format!("cipher setup failed: {e}")))?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::<Aes256Eax>::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::<Aes256Eax>::from_slice(tag),
        )
        .map_err(|_| CryptoError::DataCorrupted)?;

    Ok(buffer)
}

/// Encrypts a UTF-8 string.
pub fn encrypt_str(key: &SymmetricKey, plaintext: &str) -> CryptoResult<EncryptedField> {
    encrypt_field(key, plaintext.as_bytes())
}

/// Decrypts a field holding UTF-8 text.
pub fn decrypt_string(key: &SymmetricKey, field: &EncryptedField) -> CryptoResult<String> {
    let bytes = decrypt_field(key, field)?;
    String::from_utf8(bytes)
        .map_err(|_| CryptoError::Decryption("decrypted field is not valid UTF-8".to_string()))
}

fn check_tag_and_nonce(tag: &[u8], nonce: &[u8]) -> CryptoResult<()> {
    if tag.len() != TAG_SIZE {
        return Err(CryptoError::InvalidLength {
            what: "tag",
            expected: TAG_SIZE,
            actual: tag.len(),
        });
    }
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidLength {
            what: "nonce",
            expected: NONCE_SIZE,
            actual: nonce.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::generate_random_key;

    #[test]
    fn from_columns_all_absent_is_empty() {
        let field = EncryptedField::from_columns(None, None, None).unwrap();
        assert!(field.is_empty());
    }

    #[test]
    fn from_columns_rejects_partial_triple() {
        let err = EncryptedField::from_columns(Some(vec![1, 2, 3]), None, Some(vec![0; 16]))
            .unwrap_err();
        assert!(err.is_argument_error());
    }

    #[test]
    fn columns_roundtrip() {
        let key = generate_random_key();
        let field = encrypt_field(&key, b"alice@example.com").unwrap();
        let (c, t, n) = field.clone().into_columns();
        let rebuilt = EncryptedField::from_columns(c, t, n).unwrap();
        assert_eq!(rebuilt, field);
    }

    #[test]
    fn empty_field_has_no_columns() {
        assert_eq!(EncryptedField::empty().into_columns(), (None, None, None));
    }

    #[test]
    fn short_tag_is_a_shape_error_not_corruption() {
        let key = generate_random_key();
        let field = encrypt_field(&key, b"data").unwrap();
        let err =
            decrypt_parts(&key, &field.ciphertext, &field.tag[..8], &field.nonce).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidLength { what: "tag", .. }));
    }
}
