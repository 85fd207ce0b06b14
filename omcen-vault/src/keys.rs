//! Where the master key pair comes from.
//!
//! The vault never keeps a decoded key pair around: every operation asks its
//! source for a fresh one and drops it when done.

use crate::config::VaultConfig;
use omcen_crypto::{BootstrapKey, CryptoResult, MasterKeyPair};
use std::path::PathBuf;

/// Produces the master key pair on demand.
pub trait MasterKeySource: Send + Sync {
    fn load(&self) -> CryptoResult<MasterKeyPair>;
}

/// Loads the key pair from the secret-code file and the RSA container.
pub struct KeyFiles {
    secret_code_path: PathBuf,
    rsa_key_path: PathBuf,
    bootstrap: BootstrapKey,
}

impl KeyFiles {
    pub fn new(secret_code_path: PathBuf, rsa_key_path: PathBuf, bootstrap: BootstrapKey) -> Self {
        Self {
            secret_code_path,
            rsa_key_path,
            bootstrap,
        }
    }

    pub fn from_config(config: &VaultConfig, bootstrap: BootstrapKey) -> Self {
        Self::new(config.secret_code_path(), config.rsa_key_path(), bootstrap)
    }
}

impl MasterKeySource for KeyFiles {
    fn load(&self) -> CryptoResult<MasterKeyPair> {
        MasterKeyPair::load(&self.secret_code_path, &self.rsa_key_path, &self.bootstrap)
    }
}
