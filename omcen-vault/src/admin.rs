//! Out-of-band key management.
//!
//! None of this runs on a request path. These operations produce or replace
//! the two key artifacts the vault loads at runtime. Every file is staged
//! next to its destination and renamed into place.

use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::password::{CharacterSet, generate_password};
use omcen_crypto::{BootstrapKey, MasterKeyPair, SecretCodeBlob};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Length of the generated container passphrase.
const PASSPHRASE_LEN: usize = 64;

/// Seals `passphrase` under the bootstrap key and writes the secret-code file.
pub fn write_secret_code(
    path: &Path,
    passphrase: &[u8],
    bootstrap: &BootstrapKey,
) -> VaultResult<()> {
    let blob = SecretCodeBlob::seal(passphrase, bootstrap)?;
    write_atomic(path, &blob.to_bytes())?;
    info!("wrote secret code to {}", path.display());
    Ok(())
}

/// Creates a fresh passphrase, secret-code file and key container.
///
/// Refuses to touch existing artifacts. On failure neither file is left
/// behind, so a later run can start over.
pub fn initialize_key_files(config: &VaultConfig, bootstrap: &BootstrapKey) -> VaultResult<()> {
    config.validate()?;
    let secret_code_path = config.secret_code_path();
    let rsa_key_path = config.rsa_key_path();
    for path in [&secret_code_path, &rsa_key_path] {
        if path.exists() {
            return Err(VaultError::Config(format!(
                "{} already exists; refusing to overwrite key material",
                path.display()
            )));
        }
    }

    fs::create_dir_all(&config.keys_dir)?;

    let passphrase = generate_password(PASSPHRASE_LEN, CharacterSet::Alphanumeric)?;
    let pair = MasterKeyPair::generate(config.rsa_key_bits)?;
    let container = pair.export_encrypted(passphrase.as_bytes())?;
    let secret_code = SecretCodeBlob::seal(passphrase.as_bytes(), bootstrap)?;

    let staged_code = stage(&secret_code_path, &secret_code.to_bytes())?;
    let staged_key = stage(&rsa_key_path, container.as_bytes()).inspect_err(|_| {
        discard(&[staged_code.as_path()]);
    })?;

    fs::rename(&staged_key, &rsa_key_path).inspect_err(|_| {
        discard(&[staged_code.as_path(), staged_key.as_path()]);
    })?;
    fs::rename(&staged_code, &secret_code_path).inspect_err(|_| {
        discard(&[staged_code.as_path(), rsa_key_path.as_path()]);
    })?;

    info!(
        "initialized {}-bit master key pair in {}",
        config.rsa_key_bits,
        config.keys_dir.display()
    );
    Ok(())
}

/// Replaces the key container with a newly generated pair under the
/// passphrase already held in the secret-code file.
///
/// Every tenant envelope sealed under the old pair becomes unopenable.
pub fn regenerate_key_pair(config: &VaultConfig, bootstrap: &BootstrapKey) -> VaultResult<()> {
    config.validate()?;
    let rsa_key_path = config.rsa_key_path();
    if !rsa_key_path.exists() {
        return Err(VaultError::Config(format!(
            "{} does not exist; initialize key files first",
            rsa_key_path.display()
        )));
    }

    let secret_code = fs::read(config.secret_code_path())?;
    let passphrase = SecretCodeBlob::parse(&secret_code)?.open(bootstrap)?;

    warn!(
        "regenerating master key pair at {}; existing tenant envelopes will no longer open",
        rsa_key_path.display()
    );

    let pair = MasterKeyPair::generate(config.rsa_key_bits)?;
    let container = pair.export_encrypted(&passphrase)?;
    write_atomic(&rsa_key_path, container.as_bytes())?;

    info!("regenerated {}-bit master key pair", config.rsa_key_bits);
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let staged = stage(path, data)?;
    fs::rename(&staged, path).inspect_err(|_| discard(&[staged.as_path()]))
}

/// Writes `data` to a sibling of `path` and syncs it.
fn stage(path: &Path, data: &[u8]) -> io::Result<PathBuf> {
    let staged = staging_path(path);
    let written = File::create(&staged).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });
    match written {
        Ok(()) => Ok(staged),
        Err(e) => {
            discard(&[staged.as_path()]);
            Err(e)
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!("could not remove {}: {e}", path.display());
        }
    }
}
