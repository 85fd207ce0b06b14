//! Shared key fixtures. RSA generation is slow, so each test binary builds
//! its key pairs once and reuses them.

#![allow(dead_code)]

use omcen_crypto::{BootstrapKey, MasterKeyPair, SecretCodeBlob};
use std::sync::OnceLock;

pub const TEST_BITS: usize = 2048;
pub const PASSPHRASE: &[u8] = b"omcen container passphrase";

pub fn bootstrap_key() -> BootstrapKey {
    BootstrapKey::from_bytes(*b"test bootstrap key for omcen 32b")
}

/// The key pair most tests wrap and unwrap with.
pub fn shared_pair() -> &'static MasterKeyPair {
    static PAIR: OnceLock<MasterKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| MasterKeyPair::generate(TEST_BITS).expect("key generation must succeed"))
}

/// A second, unrelated key pair for mismatch tests.
pub fn other_pair() -> &'static MasterKeyPair {
    static PAIR: OnceLock<MasterKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| MasterKeyPair::generate(TEST_BITS).expect("key generation must succeed"))
}

/// On-disk artifacts for `shared_pair`: `(secret_code_bytes, container_pem)`.
pub fn shared_artifacts() -> &'static (Vec<u8>, String) {
    static ARTIFACTS: OnceLock<(Vec<u8>, String)> = OnceLock::new();
    ARTIFACTS.get_or_init(|| {
        let secret_code = SecretCodeBlob::seal(PASSPHRASE, &bootstrap_key())
            .expect("sealing must succeed")
            .to_bytes();
        let container = shared_pair()
            .export_encrypted(PASSPHRASE)
            .expect("export must succeed")
            .to_string();
        (secret_code, container)
    })
}
