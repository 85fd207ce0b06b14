mod support;

use omcen_vault::{
    BOOTSTRAP_KEY_ENV, DATABASE_PATH_ENV, KEYS_DIR_ENV, PasswordBoxInput, PasswordBoxService,
    RSA_KEY_BITS_ENV, Service, StaticEntitlements, VaultConfig, VaultError,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn defaults() {
    let config = VaultConfig::default();
    assert_eq!(config.keys_dir, PathBuf::from("keys"));
    assert_eq!(config.secret_code_path(), PathBuf::from("keys/secret_code.bin"));
    assert_eq!(config.rsa_key_path(), PathBuf::from("keys/rsa_key.pem"));
    assert_eq!(config.rsa_key_bits, 3072);
    assert!(config.database_path.is_none());
}

#[test]
fn lookup_overrides_defaults() {
    let config = VaultConfig::from_lookup(lookup(&[
        (KEYS_DIR_ENV, "/etc/omcen/keys"),
        (DATABASE_PATH_ENV, "/var/lib/omcen/vault.duckdb"),
        (RSA_KEY_BITS_ENV, "4096"),
    ]))
    .unwrap();
    assert_eq!(config.rsa_key_path(), PathBuf::from("/etc/omcen/keys/rsa_key.pem"));
    assert_eq!(
        config.database_path,
        Some(PathBuf::from("/var/lib/omcen/vault.duckdb"))
    );
    assert_eq!(config.rsa_key_bits, 4096);
}

#[test]
fn empty_lookup_gives_defaults() {
    let config = VaultConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.keys_dir, VaultConfig::default().keys_dir);
}

#[test]
fn bad_bits_rejected() {
    let err = VaultConfig::from_lookup(lookup(&[(RSA_KEY_BITS_ENV, "lots")])).unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));

    let err = VaultConfig::from_lookup(lookup(&[(RSA_KEY_BITS_ENV, "1024")])).unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));
}

#[test]
fn json_file_fills_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.json");
    std::fs::write(&path, r#"{ "keys_dir": "/srv/keys", "rsa_key_file": "master.pem" }"#).unwrap();

    let config = VaultConfig::from_json_file(&path).unwrap();
    assert_eq!(config.rsa_key_path(), PathBuf::from("/srv/keys/master.pem"));
    assert_eq!(config.secret_code_file, "secret_code.bin");
    assert_eq!(config.rsa_key_bits, 3072);
}

#[test]
fn json_file_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = VaultConfig::from_json_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, VaultError::Io(_)));

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        VaultConfig::from_json_file(&path).unwrap_err(),
        VaultError::Config(_)
    ));

    std::fs::write(&path, r#"{ "secret_code_file": "" }"#).unwrap();
    assert!(matches!(
        VaultConfig::from_json_file(&path).unwrap_err(),
        VaultError::Config(_)
    ));
}

#[test]
fn serialization_roundtrip() {
    let config = VaultConfig {
        database_path: Some(PathBuf::from("vault.duckdb")),
        ..VaultConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: VaultConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.database_path, config.database_path);
    assert_eq!(back.rsa_key_bits, config.rsa_key_bits);
    assert!(!json.contains("bootstrap"));
}

// ── Bootstrap key ────────────────────────────────────────────────

#[test]
fn bootstrap_key_from_hex() {
    let hex = support::bootstrap_hex();
    let vars = [(BOOTSTRAP_KEY_ENV, hex.as_str())];
    assert!(VaultConfig::bootstrap_key_from_lookup(lookup(&vars)).is_ok());
}

#[test]
fn bootstrap_key_missing_or_malformed() {
    let err = VaultConfig::bootstrap_key_from_lookup(lookup(&[])).unwrap_err();
    assert!(matches!(&err, VaultError::Config(msg) if msg.contains(BOOTSTRAP_KEY_ENV)));

    let too_long = "0".repeat(66);
    for bad in ["zz", "abcd", too_long.as_str()] {
        let err =
            VaultConfig::bootstrap_key_from_lookup(lookup(&[(BOOTSTRAP_KEY_ENV, bad)])).unwrap_err();
        assert!(matches!(err, VaultError::Config(_)), "{bad}");
    }
}

// ── Wiring ───────────────────────────────────────────────────────

#[test]
fn service_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("vault.duckdb");
    let hex = support::bootstrap_hex();
    let vars = [
        (KEYS_DIR_ENV, support::shared_config().keys_dir.to_str().unwrap()),
        (DATABASE_PATH_ENV, db_path.to_str().unwrap()),
        (BOOTSTRAP_KEY_ENV, hex.as_str()),
    ];

    let config = VaultConfig::from_lookup(lookup(&vars)).unwrap();
    let bootstrap = VaultConfig::bootstrap_key_from_lookup(lookup(&vars)).unwrap();
    let entitlements = Arc::new(StaticEntitlements::new());
    entitlements.grant("carol", Service::PasswordBox);

    let service = PasswordBoxService::from_config(&config, bootstrap, entitlements).unwrap();
    service.provision_tenant("carol", Service::PasswordBox).unwrap();
    let box_id = service
        .create_box("carol", &PasswordBoxInput::new("mail", "carol", "pw", ""))
        .unwrap();
    assert_eq!(service.open_box("carol", box_id).unwrap().password.as_str(), "pw");
    assert!(db_path.exists());
}
