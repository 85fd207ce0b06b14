//! Per-tenant key envelopes.
//!
//! Every tenant owns one random 256-bit key. Only its RSA-OAEP wrapped form
//! is ever persisted; the raw key is rebuilt in memory for the duration of a
//! single read or write and dropped (zeroized) afterwards.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KEY_SIZE, SymmetricKey, generate_random_key};
use crate::master_key::{MasterKeyPair, oaep_encrypt};
use serde::{Deserialize, Serialize};

/// A tenant key wrapped under the shared RSA public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrappedTenantKey(Vec<u8>);

impl WrappedTenantKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Creates a fresh tenant key and wraps it with a PEM-encoded public key.
///
/// The raw key never leaves this function. Any failure means no envelope
/// exists and the tenant must not be created.
pub fn provision_tenant_key(public_key_pem: &[u8]) -> CryptoResult<WrappedTenantKey> {
    let key = generate_random_key();
    let wrapped = oaep_encrypt(key.as_bytes(), public_key_pem)?;
    Ok(WrappedTenantKey(wrapped))
}

/// Wraps an existing tenant key with the loaded key pair.
pub fn seal_tenant_key(
    key: &SymmetricKey,
    master: &MasterKeyPair,
) -> CryptoResult<WrappedTenantKey> {
    master.wrap_key(key.as_bytes()).map(WrappedTenantKey)
}

/// Unwraps a tenant key with the loaded key pair.
///
/// A wrong-length envelope is a shape error; anything the RSA layer rejects,
/// or a plaintext that is not exactly one key long, is an
/// [`CryptoError::EnvelopeUnwrap`].
pub fn open_tenant_key(
    wrapped: &WrappedTenantKey,
    master: &MasterKeyPair,
) -> CryptoResult<SymmetricKey> {
    let expected = master.modulus_len();
    if wrapped.len() != expected {
        return Err(CryptoError::InvalidLength {
            what: "wrapped tenant key",
            expected,
            actual: wrapped.len(),
        });
    }

    let plaintext = master.unwrap_key(wrapped.as_bytes()).map_err(|e| match e {
        CryptoError::Decryption(msg) => {
            CryptoError::EnvelopeUnwrap(format!("{msg} (corrupt envelope or key pair mismatch)"))
        }
        other => other,
    })?;

    if plaintext.len() != KEY_SIZE {
        return Err(CryptoError::EnvelopeUnwrap(format!(
            "unwrapped key is {} bytes, expected {KEY_SIZE}",
            plaintext.len()
        )));
    }
    SymmetricKey::from_slice(&plaintext)
}
