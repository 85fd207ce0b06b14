//! Envelope encryption core for Omcen.
//!
//! Protects small user secrets at rest using:
//! - AES-256-EAX for field-level authenticated encryption
//! - RSA-3072 OAEP for wrapping per-tenant keys
//! - A passphrase-protected PKCS#8 container for the RSA private key
//! - Secure key management with zeroization
//!
//! # Architecture
//!
//! The key hierarchy has three layers, each unlocking the next:
//!
//! 1. **Bootstrap Key**: Injected through configuration. Decrypts the
//!    secret-code file, which yields the passphrase of the RSA container.
//!
//! 2. **Master Key Pair**: A shared RSA key pair. The public half wraps
//!    tenant keys; the private half unwraps them.
//!
//! 3. **Tenant Key**: A random key generated once per tenant. Only the
//!    wrapped form is stored. It encrypts each sensitive field into a
//!    ciphertext, tag and nonce triple.
//!
//! Key material is loaded per operation and never cached. Keys are held in
//! `zeroize` wrappers; copies made inside third-party libraries cannot be
//! scrubbed, so wiping is best-effort.

pub mod envelope;
mod error;
pub mod field;
mod key;
pub mod master_key;
mod secret_code;

pub use envelope::{WrappedTenantKey, open_tenant_key, provision_tenant_key, seal_tenant_key};
pub use error::{CryptoError, CryptoResult};
pub use field::{
    EncryptedField, NONCE_SIZE, TAG_SIZE, decrypt_field, decrypt_parts, decrypt_string,
    encrypt_field, encrypt_str,
};
pub use key::{BootstrapKey, KEY_SIZE, SymmetricKey, generate_random_key};
pub use master_key::{MasterKeyPair, RSA_KEY_BITS, max_wrap_len, oaep_decrypt, oaep_encrypt};
pub use secret_code::SecretCodeBlob;
