//! Vault configuration.

use crate::error::{VaultError, VaultResult};
use omcen_crypto::{BootstrapKey, RSA_KEY_BITS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Directory holding the key artifacts.
pub const KEYS_DIR_ENV: &str = "OMCEN_KEYS_DIR";
/// DuckDB file; unset means an in-memory database.
pub const DATABASE_PATH_ENV: &str = "OMCEN_DATABASE_PATH";
/// Modulus size used when generating a new key pair.
pub const RSA_KEY_BITS_ENV: &str = "OMCEN_RSA_KEY_BITS";
/// Hex-encoded 32-byte key protecting the secret-code file.
pub const BOOTSTRAP_KEY_ENV: &str = "OMCEN_BOOTSTRAP_KEY";

/// Configuration for the vault and its key artifacts.
///
/// The bootstrap key is not part of this struct; load it with
/// [`VaultConfig::bootstrap_key`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory containing the secret-code file and the RSA key container.
    pub keys_dir: PathBuf,

    /// Secret-code file name inside `keys_dir`.
    pub secret_code_file: String,

    /// RSA key container file name inside `keys_dir`.
    pub rsa_key_file: String,

    /// Modulus size for newly generated key pairs.
    pub rsa_key_bits: usize,

    /// DuckDB database file (`None` for in-memory).
    pub database_path: Option<PathBuf>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            keys_dir: PathBuf::from("keys"),
            secret_code_file: "secret_code.bin".to_string(),
            rsa_key_file: "rsa_key.pem".to_string(),
            rsa_key_bits: RSA_KEY_BITS,
            database_path: None,
        }
    }
}

impl VaultConfig {
    /// Builds a config from process environment variables over defaults.
    pub fn from_env() -> VaultResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup over defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> VaultResult<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup(KEYS_DIR_ENV) {
            config.keys_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Some(bits) = lookup(RSA_KEY_BITS_ENV) {
            config.rsa_key_bits = bits.trim().parse().map_err(|_| {
                VaultError::Config(format!("{RSA_KEY_BITS_ENV} is not a number: {bits}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> VaultResult<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VaultResult<()> {
        if self.secret_code_file.is_empty() || self.rsa_key_file.is_empty() {
            return Err(VaultError::Config("key file names must not be empty".to_string()));
        }
        if self.rsa_key_bits < 2048 {
            return Err(VaultError::Config(format!(
                "rsa_key_bits must be at least 2048, got {}",
                self.rsa_key_bits
            )));
        }
        Ok(())
    }

    pub fn secret_code_path(&self) -> PathBuf {
        self.keys_dir.join(&self.secret_code_file)
    }

    pub fn rsa_key_path(&self) -> PathBuf {
        self.keys_dir.join(&self.rsa_key_file)
    }

    /// Reads the bootstrap key from the process environment.
    pub fn bootstrap_key() -> VaultResult<BootstrapKey> {
        Self::bootstrap_key_from_lookup(|name| std::env::var(name).ok())
    }

    pub fn bootstrap_key_from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> VaultResult<BootstrapKey> {
        let encoded = Zeroizing::new(
            lookup(BOOTSTRAP_KEY_ENV)
                .ok_or_else(|| VaultError::Config(format!("{BOOTSTRAP_KEY_ENV} is not set")))?,
        );
        BootstrapKey::from_hex(&encoded)
            .map_err(|e| VaultError::Config(format!("{BOOTSTRAP_KEY_ENV}: {e}")))
    }
}
