//! Shared fixtures. The key files are generated once per test binary.

#![allow(dead_code)]

use omcen_crypto::{BootstrapKey, CryptoResult, MasterKeyPair};
use omcen_vault::{
    KeyFiles, MasterKeySource, PasswordBoxService, Service, StaticEntitlements, VaultConfig,
    VaultStore, admin,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

pub const TEST_BITS: usize = 2048;
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub fn bootstrap_key() -> BootstrapKey {
    BootstrapKey::from_bytes(*b"vault tests bootstrap key 32byte")
}

/// Hex form of [`bootstrap_key`], as it would appear in the environment.
pub fn bootstrap_hex() -> String {
    b"vault tests bootstrap key 32byte"
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub fn test_config(keys_dir: &Path) -> VaultConfig {
    VaultConfig {
        keys_dir: keys_dir.to_path_buf(),
        rsa_key_bits: TEST_BITS,
        ..VaultConfig::default()
    }
}

/// Key files shared by every test in the binary.
pub fn shared_config() -> &'static VaultConfig {
    static KEYS: OnceLock<(TempDir, VaultConfig)> = OnceLock::new();
    let (_, config) = KEYS.get_or_init(|| {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(dir.path());
        admin::initialize_key_files(&config, &bootstrap_key()).expect("key files");
        (dir, config)
    });
    config
}

/// Key source that counts how often the master key pair is loaded.
pub struct CountingKeys {
    inner: KeyFiles,
    loads: AtomicUsize,
}

impl CountingKeys {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            inner: KeyFiles::from_config(config, bootstrap_key()),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl MasterKeySource for CountingKeys {
    fn load(&self) -> CryptoResult<MasterKeyPair> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load()
    }
}

pub struct Harness {
    pub service: PasswordBoxService,
    pub store: VaultStore,
    pub keys: Arc<CountingKeys>,
    pub entitlements: Arc<StaticEntitlements>,
}

impl Harness {
    /// In-memory store over the shared key files, nobody subscribed.
    pub fn new() -> Self {
        Self::with_store(VaultStore::open_in_memory().expect("store"))
    }

    pub fn with_store(store: VaultStore) -> Self {
        let keys = Arc::new(CountingKeys::new(shared_config()));
        let entitlements = Arc::new(StaticEntitlements::new());
        let service = PasswordBoxService::new(store.clone(), keys.clone(), entitlements.clone());
        Self {
            service,
            store,
            keys,
            entitlements,
        }
    }

    /// Subscribes `user` to password boxes and provisions their tenant.
    pub fn subscribe(&self, user: &str) {
        self.entitlements.grant(user, Service::PasswordBox);
        self.service
            .provision_tenant(user, Service::PasswordBox)
            .expect("provisioning");
    }
}
