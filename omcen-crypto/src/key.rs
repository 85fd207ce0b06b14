//! Symmetric key types.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key, scrubbed from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, rejecting anything that is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidLength {
                what: "symmetric key",
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Generates a random key from the OS RNG.
pub fn generate_random_key() -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let key = SymmetricKey(bytes);
    bytes.zeroize();
    key
}

/// The deployment-wide key that protects the secret-code file.
///
/// Injected through configuration, never compiled in.
#[derive(Clone)]
pub struct BootstrapKey(SymmetricKey);

impl BootstrapKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(SymmetricKey::from_bytes(bytes))
    }

    /// Parses a key from 64 hex characters (surrounding whitespace ignored).
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let mut decoded = hex::decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidArgument(format!("bootstrap key is not hex: {e}")))?;
        let key = SymmetricKey::from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(key?))
    }

    pub(crate) fn key(&self) -> &SymmetricKey {
        &self.0
    }
}

impl std::fmt::Debug for BootstrapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BootstrapKey([REDACTED])")
    }
}
