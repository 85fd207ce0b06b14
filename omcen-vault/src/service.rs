//! Tenant provisioning and password box operations.
//!
//! Every call checks the caller's entitlement first, then validates its
//! input, and only then touches key material. The master key pair and the
//! tenant key are loaded inside each call and dropped before it returns.

use crate::config::VaultConfig;
use crate::entitlement::Entitlements;
use crate::error::{VaultError, VaultResult};
use crate::keys::{KeyFiles, MasterKeySource};
use crate::store::{BoxFields, StoredBox, VaultStore};
use crate::types::{
    PasswordBox, PasswordBoxInput, PasswordBoxSummary, SecretField, Service, TenantRecord,
};
use chrono::Utc;
use omcen_crypto::{
    BootstrapKey, CryptoError, SymmetricKey, decrypt_string, encrypt_str, open_tenant_key,
    provision_tenant_key,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Maximum box name length in characters.
pub const MAX_BOX_NAME_LEN: usize = 64;

/// Password box vault for all subscribed users.
pub struct PasswordBoxService {
    store: VaultStore,
    keys: Arc<dyn MasterKeySource>,
    entitlements: Arc<dyn Entitlements>,
}

impl PasswordBoxService {
    pub fn new(
        store: VaultStore,
        keys: Arc<dyn MasterKeySource>,
        entitlements: Arc<dyn Entitlements>,
    ) -> Self {
        Self {
            store,
            keys,
            entitlements,
        }
    }

    /// Wires a service from config: key files, store and entitlements.
    pub fn from_config(
        config: &VaultConfig,
        bootstrap: BootstrapKey,
        entitlements: Arc<dyn Entitlements>,
    ) -> VaultResult<Self> {
        let store = VaultStore::from_config(config)?;
        let keys = Arc::new(KeyFiles::from_config(config, bootstrap));
        Ok(Self::new(store, keys, entitlements))
    }

    // ── Tenants ──────────────────────────────────────────────────

    /// Creates the user's key envelope for `service`.
    ///
    /// This is the only place a tenant key is generated. Fails with
    /// `AlreadyProvisioned` if the user already has an active envelope.
    pub fn provision_tenant(&self, user_id: &str, service: Service) -> VaultResult<TenantRecord> {
        self.check_entitlement(user_id, service)?;
        if self.store.find_tenant(user_id, service)?.is_some() {
            return Err(VaultError::AlreadyProvisioned {
                user_id: user_id.to_string(),
                service,
            });
        }

        let wrapped_key = {
            let pair = self.keys.load()?;
            provision_tenant_key(&pair.public_key())?
        };

        let now = Utc::now();
        let tenant = TenantRecord {
            tenant_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            service,
            wrapped_key,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_tenant(&tenant)?;

        info!("provisioned {service} tenant {} for user {user_id}", tenant.tenant_id);
        Ok(tenant)
    }

    /// The user's active tenant for `service`.
    pub fn tenant(&self, user_id: &str, service: Service) -> VaultResult<TenantRecord> {
        self.check_entitlement(user_id, service)?;
        self.store
            .find_tenant(user_id, service)?
            .ok_or_else(|| VaultError::TenantNotFound {
                user_id: user_id.to_string(),
                service,
            })
    }

    /// Deactivates the user's tenant. Existing boxes become unreachable.
    pub fn deactivate_tenant(&self, user_id: &str, service: Service) -> VaultResult<()> {
        let tenant = self.tenant(user_id, service)?;
        self.store.deactivate_tenant(tenant.tenant_id)?;
        info!("deactivated {service} tenant {} for user {user_id}", tenant.tenant_id);
        Ok(())
    }

    // ── Password boxes ───────────────────────────────────────────

    pub fn create_box(&self, user_id: &str, input: &PasswordBoxInput) -> VaultResult<Uuid> {
        let tenant = self.tenant(user_id, Service::PasswordBox)?;
        validate_input(input)?;

        let fields = {
            let key = self.tenant_key(&tenant)?;
            encrypt_fields(&key, input)?
        };

        let now = Utc::now();
        let stored = StoredBox {
            box_id: Uuid::new_v4(),
            tenant_id: tenant.tenant_id,
            box_name: input.box_name.clone(),
            fields,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_box(&stored)?;

        debug!("created password box {} for tenant {}", stored.box_id, tenant.tenant_id);
        Ok(stored.box_id)
    }

    /// Replaces the name and all three fields of a box.
    ///
    /// Every field gets a fresh nonce; a field left empty in `input` is
    /// cleared. The old triples are never read, so a box whose stored
    /// fields are damaged can still be overwritten.
    pub fn update_box(
        &self,
        user_id: &str,
        box_id: Uuid,
        input: &PasswordBoxInput,
    ) -> VaultResult<()> {
        let tenant = self.tenant(user_id, Service::PasswordBox)?;
        validate_input(input)?;
        let created_at = self.store.box_created_at(tenant.tenant_id, box_id)?;

        let fields = {
            let key = self.tenant_key(&tenant)?;
            encrypt_fields(&key, input)?
        };

        let stored = StoredBox {
            box_id,
            tenant_id: tenant.tenant_id,
            box_name: input.box_name.clone(),
            fields,
            is_active: true,
            created_at,
            updated_at: Utc::now(),
        };
        self.store.replace_box(&stored)?;

        debug!("updated password box {box_id} for tenant {}", tenant.tenant_id);
        Ok(())
    }

    /// Decrypts a box.
    ///
    /// A field that fails authentication is reported as `FieldCorrupted`
    /// naming the field; nothing is returned for the other fields.
    pub fn open_box(&self, user_id: &str, box_id: Uuid) -> VaultResult<PasswordBox> {
        let tenant = self.tenant(user_id, Service::PasswordBox)?;
        let stored = self.store.get_box(tenant.tenant_id, box_id)?;

        let key = self.tenant_key(&tenant)?;
        let [user_name, password, email] = [
            decrypt_secret(&key, &stored, SecretField::UserName)?,
            decrypt_secret(&key, &stored, SecretField::Password)?,
            decrypt_secret(&key, &stored, SecretField::Email)?,
        ];

        Ok(PasswordBox {
            box_id: stored.box_id,
            box_name: stored.box_name,
            user_name,
            password,
            email,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    /// Hides a box from `open_box` and `list_boxes` without deleting it.
    pub fn deactivate_box(&self, user_id: &str, box_id: Uuid) -> VaultResult<()> {
        let tenant = self.tenant(user_id, Service::PasswordBox)?;
        self.store.deactivate_box(tenant.tenant_id, box_id)?;
        info!("deactivated password box {box_id} for tenant {}", tenant.tenant_id);
        Ok(())
    }

    pub fn delete_box(&self, user_id: &str, box_id: Uuid) -> VaultResult<()> {
        let tenant = self.tenant(user_id, Service::PasswordBox)?;
        self.store.delete_box(tenant.tenant_id, box_id)?;
        debug!("deleted password box {box_id} for tenant {}", tenant.tenant_id);
        Ok(())
    }

    /// The user's boxes ordered by name. No key material is touched.
    pub fn list_boxes(&self, user_id: &str) -> VaultResult<Vec<PasswordBoxSummary>> {
        let tenant = self.tenant(user_id, Service::PasswordBox)?;
        self.store.list_boxes(tenant.tenant_id)
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn check_entitlement(&self, user_id: &str, service: Service) -> VaultResult<()> {
        if self.entitlements.is_subscribed(user_id, service) {
            Ok(())
        } else {
            debug!("user {user_id} is not subscribed to {service}");
            Err(VaultError::NotEntitled {
                user_id: user_id.to_string(),
                service,
            })
        }
    }

    fn tenant_key(&self, tenant: &TenantRecord) -> VaultResult<SymmetricKey> {
        let pair = self.keys.load()?;
        open_tenant_key(&tenant.wrapped_key, &pair).map_err(|e| {
            warn!("tenant {} envelope could not be opened: {e}", tenant.tenant_id);
            VaultError::from(e)
        })
    }
}

/// Checks the box name and field sizes before any encryption happens.
pub fn validate_input(input: &PasswordBoxInput) -> VaultResult<()> {
    let name = input.box_name.as_str();
    if name.is_empty() {
        return Err(VaultError::InvalidBoxName("box name is required".to_string()));
    }
    if name.chars().count() > MAX_BOX_NAME_LEN {
        return Err(VaultError::InvalidBoxName(format!(
            "box name longer than {MAX_BOX_NAME_LEN} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c))) {
        return Err(VaultError::InvalidBoxName(format!(
            "box name may only contain letters, digits and @.+-_ (found {c:?})"
        )));
    }

    for field in SecretField::ALL {
        let actual = input.secret(field).len();
        if actual > field.max_len() {
            return Err(VaultError::FieldTooLong {
                field,
                max: field.max_len(),
                actual,
            });
        }
    }
    Ok(())
}

fn encrypt_fields(key: &SymmetricKey, input: &PasswordBoxInput) -> VaultResult<BoxFields> {
    let mut fields = BoxFields::default();
    for field in SecretField::ALL {
        fields.set(field, encrypt_str(key, input.secret(field))?);
    }
    Ok(fields)
}

fn decrypt_secret(
    key: &SymmetricKey,
    stored: &StoredBox,
    field: SecretField,
) -> VaultResult<Zeroizing<String>> {
    match decrypt_string(key, stored.fields.get(field)) {
        Ok(plaintext) => Ok(Zeroizing::new(plaintext)),
        Err(CryptoError::DataCorrupted) => {
            warn!("password box {} field {field} failed authentication", stored.box_id);
            Err(VaultError::FieldCorrupted { field })
        }
        Err(e) => Err(e.into()),
    }
}
