//! Error types for the envelope encryption core.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in key unwrap, envelope and field operations.
///
/// Shape errors (`InvalidLength`, `InvalidArgument`) are always raised before
/// any cipher runs, so a malformed input never reports as `DataCorrupted`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A key artifact could not be read. Not a cryptographic failure.
    #[error("key material unavailable ({what}): {source}")]
    KeyMaterialUnavailable {
        what: String,
        #[source]
        source: std::io::Error,
    },

    /// The secret code failed authentication, or the RSA container could not
    /// be decoded with the recovered passphrase.
    #[error("key import failed: {0}")]
    KeyImport(String),

    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// A tenant envelope could not be unwrapped with the loaded key pair.
    /// Either the envelope is corrupt or the key pair has changed.
    #[error("tenant key unwrap failed: {0}")]
    EnvelopeUnwrap(String),

    /// Authentication tag verification failed.
    #[error("data corrupted: authentication tag mismatch")]
    DataCorrupted,
}

impl CryptoError {
    /// Whether the error means stored data was altered or mismatched.
    pub fn is_data_corrupted(&self) -> bool {
        matches!(self, CryptoError::DataCorrupted)
    }

    /// Whether the error was raised by an argument check before any cipher ran.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            CryptoError::InvalidLength { .. } | CryptoError::InvalidArgument(_)
        )
    }

    pub(crate) fn unavailable(what: impl Into<String>, source: std::io::Error) -> Self {
        CryptoError::KeyMaterialUnavailable {
            what: what.into(),
            source,
        }
    }
}
