//! Random password generation for new password boxes.

use crate::error::{VaultError, VaultResult};
use rand::Rng;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

pub const DEFAULT_PASSWORD_LENGTH: usize = 12;
pub const MAX_PASSWORD_LENGTH: usize = 1024;

const DIGITS: &str = "0123456789";
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SYMBOLS: &str = "`~!@#$%^&*()_+-={}[]\\|:;\"'<>,.?/";

/// Which characters a generated password may contain. Each level includes
/// the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CharacterSet {
    Digits,
    Alphanumeric,
    #[default]
    All,
}

impl CharacterSet {
    /// Maps the numeric levels 1..=3 used by form input.
    pub fn from_level(level: u8) -> VaultResult<Self> {
        match level {
            1 => Ok(CharacterSet::Digits),
            2 => Ok(CharacterSet::Alphanumeric),
            3 => Ok(CharacterSet::All),
            other => Err(VaultError::InvalidPasswordSpec(format!(
                "character level must be 1, 2 or 3, got {other}"
            ))),
        }
    }

    fn alphabet(&self) -> String {
        match self {
            CharacterSet::Digits => DIGITS.to_string(),
            CharacterSet::Alphanumeric => [DIGITS, LETTERS].concat(),
            CharacterSet::All => [DIGITS, LETTERS, SYMBOLS].concat(),
        }
    }
}

/// Generates a password of `length` characters drawn uniformly from `charset`
/// using the OS random source.
pub fn generate_password(length: usize, charset: CharacterSet) -> VaultResult<Zeroizing<String>> {
    if length == 0 || length > MAX_PASSWORD_LENGTH {
        return Err(VaultError::InvalidPasswordSpec(format!(
            "length must be between 1 and {MAX_PASSWORD_LENGTH}, got {length}"
        )));
    }

    let alphabet = charset.alphabet().into_bytes();
    let mut rng = OsRng;
    let password: String = (0..length)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect();
    Ok(Zeroizing::new(password))
}
