//! Vault record types.

use chrono::{DateTime, Utc};
use omcen_crypto::WrappedTenantKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use zeroize::Zeroizing;

/// A subscribable service that owns a per-user key envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    PasswordBox,
    FileEncryption,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::PasswordBox => "password_box",
            Service::FileEncryption => "file_encryption",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password_box" => Ok(Service::PasswordBox),
            "file_encryption" => Ok(Service::FileEncryption),
            other => Err(format!("unknown service: {other}")),
        }
    }
}

/// The encrypted fields of a password box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SecretField {
    UserName,
    Password,
    Email,
}

impl SecretField {
    pub const ALL: [SecretField; 3] =
        [SecretField::UserName, SecretField::Password, SecretField::Email];

    /// Maximum plaintext size in bytes. EAX ciphertext is the same length.
    pub fn max_len(&self) -> usize {
        match self {
            SecretField::UserName => 128,
            SecretField::Password => 1024,
            SecretField::Email => 256,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretField::UserName => "user_name",
            SecretField::Password => "password",
            SecretField::Email => "email",
        }
    }
}

impl fmt::Display for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant's key envelope for one service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TenantRecord {
    pub tenant_id: Uuid,
    pub user_id: String,
    pub service: Service,
    pub wrapped_key: WrappedTenantKey,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plaintext input for creating or replacing a password box.
///
/// Empty strings mean "no value" and are stored as absent fields.
#[derive(Clone, Default)]
pub struct PasswordBoxInput {
    pub box_name: String,
    pub user_name: Zeroizing<String>,
    pub password: Zeroizing<String>,
    pub email: Zeroizing<String>,
}

impl PasswordBoxInput {
    pub fn new(
        box_name: impl Into<String>,
        user_name: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            box_name: box_name.into(),
            user_name: Zeroizing::new(user_name.into()),
            password: Zeroizing::new(password.into()),
            email: Zeroizing::new(email.into()),
        }
    }

    pub fn secret(&self, field: SecretField) -> &str {
        match field {
            SecretField::UserName => &self.user_name,
            SecretField::Password => &self.password,
            SecretField::Email => &self.email,
        }
    }
}

impl fmt::Debug for PasswordBoxInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordBoxInput")
            .field("box_name", &self.box_name)
            .finish_non_exhaustive()
    }
}

/// A decrypted password box.
pub struct PasswordBox {
    pub box_id: Uuid,
    pub box_name: String,
    pub user_name: Zeroizing<String>,
    pub password: Zeroizing<String>,
    pub email: Zeroizing<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for PasswordBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordBox")
            .field("box_id", &self.box_id)
            .field("box_name", &self.box_name)
            .finish_non_exhaustive()
    }
}

/// Listing entry; carries no secret material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PasswordBoxSummary {
    pub box_id: Uuid,
    pub box_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
