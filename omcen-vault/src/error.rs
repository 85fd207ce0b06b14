//! Vault error types.

use crate::types::{SecretField, Service};
use omcen_crypto::CryptoError;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur in vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("user {user_id} is not subscribed to {service}")]
    NotEntitled { user_id: String, service: Service },

    #[error("no {service} tenant for user {user_id}")]
    TenantNotFound { user_id: String, service: Service },

    #[error("{service} tenant already provisioned for user {user_id}")]
    AlreadyProvisioned { user_id: String, service: Service },

    #[error("password box not found: {0}")]
    BoxNotFound(String),

    #[error("a password box named {0:?} already exists")]
    DuplicateBoxName(String),

    #[error("invalid box name: {0}")]
    InvalidBoxName(String),

    #[error("{field} too long: {actual} bytes (max {max})")]
    FieldTooLong {
        field: SecretField,
        max: usize,
        actual: usize,
    },

    /// A stored field failed authentication; it may have been tampered with.
    #[error("{field} may have been tampered with")]
    FieldCorrupted { field: SecretField },

    #[error("invalid password parameters: {0}")]
    InvalidPasswordSpec(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl VaultError {
    /// Whether the caller should warn that stored data may have been altered.
    pub fn is_data_corrupted(&self) -> bool {
        match self {
            VaultError::FieldCorrupted { .. } => true,
            VaultError::Crypto(e) => e.is_data_corrupted(),
            _ => false,
        }
    }
}

