//! Per-tenant encrypted password boxes.
//!
//! Built on `omcen-crypto`: each subscribed user gets a random tenant key
//! wrapped under the service master key pair, and every password box field
//! is sealed with that tenant key. Records live in DuckDB; a field's
//! ciphertext, tag and nonce are written together or not at all.
//!
//! Key material is never cached. Each operation loads the master key pair,
//! unwraps the tenant key, does its work and drops both.

pub mod admin;
mod config;
mod entitlement;
mod error;
mod keys;
pub mod logging;
pub mod password;
mod service;
mod store;
mod types;

pub use config::{
    BOOTSTRAP_KEY_ENV, DATABASE_PATH_ENV, KEYS_DIR_ENV, RSA_KEY_BITS_ENV, VaultConfig,
};
pub use entitlement::{Entitlements, StaticEntitlements};
pub use error::{VaultError, VaultResult};
pub use keys::{KeyFiles, MasterKeySource};
pub use password::{CharacterSet, DEFAULT_PASSWORD_LENGTH, generate_password};
pub use service::{MAX_BOX_NAME_LEN, PasswordBoxService, validate_input};
pub use store::{BoxFields, StoredBox, VaultStore};
pub use types::{
    PasswordBox, PasswordBoxInput, PasswordBoxSummary, SecretField, Service, TenantRecord,
};

