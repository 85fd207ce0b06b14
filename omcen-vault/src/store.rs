//! DuckDB-backed record store for tenants and password boxes.
//!
//! Ciphertexts, tags and nonces live in three parallel tables keyed by box
//! id. A box's field triples are always written in a single transaction.

use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::types::{PasswordBoxSummary, SecretField, Service, TenantRecord};
use chrono::{DateTime, Utc};
use duckdb::{Connection, OptionalExt, params};
use omcen_crypto::{EncryptedField, WrappedTenantKey};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// The three encrypted fields of one box.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoxFields {
    pub user_name: EncryptedField,
    pub password: EncryptedField,
    pub email: EncryptedField,
}

impl BoxFields {
    pub fn get(&self, field: SecretField) -> &EncryptedField {
        match field {
            SecretField::UserName => &self.user_name,
            SecretField::Password => &self.password,
            SecretField::Email => &self.email,
        }
    }

    pub fn set(&mut self, field: SecretField, value: EncryptedField) {
        match field {
            SecretField::UserName => self.user_name = value,
            SecretField::Password => self.password = value,
            SecretField::Email => self.email = value,
        }
    }
}

/// A password box row as stored.
#[derive(Clone, Debug)]
pub struct StoredBox {
    pub box_id: Uuid,
    pub tenant_id: Uuid,
    pub box_name: String,
    pub fields: BoxFields,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

type Columns = (Option<Vec<u8>>, Option<Vec<u8>>, Option<Vec<u8>>);

/// Record store shared by the vault services.
#[derive(Clone)]
pub struct VaultStore {
    conn: Arc<Mutex<Connection>>,
}

impl VaultStore {
    /// Opens (or creates) a store backed by a DuckDB file.
    pub fn open(db_path: &Path) -> VaultResult<Self> {
        let conn = Connection::open(db_path).map_err(|e| VaultError::Storage(e.to_string()))?;

        // DuckDB defaults to ~80% RAM per connection
        conn.execute_batch("PRAGMA memory_limit='64MB'; PRAGMA threads=1;")
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> VaultResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| VaultError::Storage(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Opens the store the config points at.
    pub fn from_config(config: &VaultConfig) -> VaultResult<Self> {
        match &config.database_path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    fn with_connection(conn: Connection) -> VaultResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn lock(&self) -> VaultResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| VaultError::Storage(e.to_string()))
    }

    fn ensure_tables(&self) -> VaultResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tenants (
                tenant_id VARCHAR PRIMARY KEY,
                user_id VARCHAR NOT NULL,
                service VARCHAR NOT NULL,
                wrapped_key BLOB NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS password_boxes (
                box_id VARCHAR PRIMARY KEY,
                tenant_id VARCHAR NOT NULL,
                box_name VARCHAR NOT NULL,
                user_name BLOB,
                password BLOB,
                email BLOB,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS password_box_tags (
                box_id VARCHAR PRIMARY KEY,
                user_name BLOB,
                password BLOB,
                email BLOB
            );
            CREATE TABLE IF NOT EXISTS password_box_nonces (
                box_id VARCHAR PRIMARY KEY,
                user_name BLOB,
                password BLOB,
                email BLOB
            );",
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Tenants ──────────────────────────────────────────────────

    /// Inserts a tenant; at most one active tenant per (user, service).
    pub fn insert_tenant(&self, tenant: &TenantRecord) -> VaultResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| VaultError::Storage(e.to_string()))?;

        let existing: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM tenants WHERE user_id = ? AND service = ? AND is_active",
                params![tenant.user_id, tenant.service.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        if existing > 0 {
            return Err(VaultError::AlreadyProvisioned {
                user_id: tenant.user_id.clone(),
                service: tenant.service,
            });
        }

        tx.execute(
            "INSERT INTO tenants (tenant_id, user_id, service, wrapped_key, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                tenant.tenant_id.to_string(),
                tenant.user_id,
                tenant.service.as_str(),
                tenant.wrapped_key.as_bytes(),
                tenant.is_active,
                tenant.created_at.timestamp_millis(),
                tenant.updated_at.timestamp_millis(),
            ],
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;

        tx.commit().map_err(|e| VaultError::Storage(e.to_string()))
    }

    /// The active tenant for a user and service, if any.
    pub fn find_tenant(
        &self,
        user_id: &str,
        service: Service,
    ) -> VaultResult<Option<TenantRecord>> {
        let conn = self.lock()?;
        let row: Option<(String, Vec<u8>, bool, i64, i64)> = conn
            .query_row(
                "SELECT tenant_id, wrapped_key, is_active, created_at, updated_at
                 FROM tenants WHERE user_id = ? AND service = ? AND is_active",
                params![user_id, service.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        row.map(|(tenant_id, wrapped_key, is_active, created_at, updated_at)| {
            Ok(TenantRecord {
                tenant_id: parse_id(&tenant_id)?,
                user_id: user_id.to_string(),
                service,
                wrapped_key: WrappedTenantKey::from_bytes(wrapped_key),
                is_active,
                created_at: from_millis(created_at)?,
                updated_at: from_millis(updated_at)?,
            })
        })
        .transpose()
    }

    /// Deactivates a tenant. Its boxes stay in place but become unreachable.
    pub fn deactivate_tenant(&self, tenant_id: Uuid) -> VaultResult<()> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE tenants SET is_active = FALSE, updated_at = ? WHERE tenant_id = ? AND is_active",
                params![Utc::now().timestamp_millis(), tenant_id.to_string()],
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(VaultError::Storage(format!("no active tenant {tenant_id}")));
        }
        Ok(())
    }

    // ── Password boxes ───────────────────────────────────────────

    /// Inserts a box and its tag and nonce rows atomically.
    pub fn insert_box(&self, stored: &StoredBox) -> VaultResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| VaultError::Storage(e.to_string()))?;

        if name_taken(&tx, stored.tenant_id, &stored.box_name, None)? {
            return Err(VaultError::DuplicateBoxName(stored.box_name.clone()));
        }

        let (ciphertexts, tags, nonces) = split_columns(&stored.fields);
        let box_id = stored.box_id.to_string();

        tx.execute(
            "INSERT INTO password_boxes
                 (box_id, tenant_id, box_name, user_name, password, email, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                box_id,
                stored.tenant_id.to_string(),
                stored.box_name,
                ciphertexts.0,
                ciphertexts.1,
                ciphertexts.2,
                stored.is_active,
                stored.created_at.timestamp_millis(),
                stored.updated_at.timestamp_millis(),
            ],
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;

        for (table, columns) in [("password_box_tags", &tags), ("password_box_nonces", &nonces)] {
            tx.execute(
                &format!("INSERT INTO {table} (box_id, user_name, password, email) VALUES (?, ?, ?, ?)"),
                params![box_id, columns.0, columns.1, columns.2],
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        }

        tx.commit().map_err(|e| VaultError::Storage(e.to_string()))
    }

    /// Replaces name and all three field triples of an active box.
    ///
    /// `created_at` and `is_active` are left as stored.
    pub fn replace_box(&self, stored: &StoredBox) -> VaultResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| VaultError::Storage(e.to_string()))?;
        let box_id = stored.box_id.to_string();

        let exists: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM password_boxes WHERE box_id = ? AND tenant_id = ? AND is_active",
                params![box_id, stored.tenant_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        if exists == 0 {
            return Err(VaultError::BoxNotFound(box_id));
        }
        if name_taken(&tx, stored.tenant_id, &stored.box_name, Some(stored.box_id))? {
            return Err(VaultError::DuplicateBoxName(stored.box_name.clone()));
        }

        let (ciphertexts, tags, nonces) = split_columns(&stored.fields);

        tx.execute(
            "UPDATE password_boxes
             SET box_name = ?, user_name = ?, password = ?, email = ?, updated_at = ?
             WHERE box_id = ?",
            params![
                stored.box_name,
                ciphertexts.0,
                ciphertexts.1,
                ciphertexts.2,
                stored.updated_at.timestamp_millis(),
                box_id,
            ],
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;

        for (table, columns) in [("password_box_tags", &tags), ("password_box_nonces", &nonces)] {
            tx.execute(
                &format!("UPDATE {table} SET user_name = ?, password = ?, email = ? WHERE box_id = ?"),
                params![columns.0, columns.1, columns.2, box_id],
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        }

        tx.commit().map_err(|e| VaultError::Storage(e.to_string()))
    }

    /// Reads an active box with its tags and nonces.
    ///
    /// A field whose triple is only partly present is reported as an
    /// argument error rather than silently treated as empty.
    pub fn get_box(&self, tenant_id: Uuid, box_id: Uuid) -> VaultResult<StoredBox> {
        let conn = self.lock()?;
        let id = box_id.to_string();

        let row: Option<(String, Columns, i64, i64, Columns, Columns)> = conn
            .query_row(
                "SELECT b.box_name, b.user_name, b.password, b.email, b.created_at, b.updated_at,
                        t.user_name, t.password, t.email,
                        n.user_name, n.password, n.email
                 FROM password_boxes b
                 LEFT JOIN password_box_tags t ON t.box_id = b.box_id
                 LEFT JOIN password_box_nonces n ON n.box_id = b.box_id
                 WHERE b.box_id = ? AND b.tenant_id = ? AND b.is_active",
                params![id, tenant_id.to_string()],
                |row| {
                    Ok((
                        row.get(0)?,
                        (row.get(1)?, row.get(2)?, row.get(3)?),
                        row.get(4)?,
                        row.get(5)?,
                        (row.get(6)?, row.get(7)?, row.get(8)?),
                        (row.get(9)?, row.get(10)?, row.get(11)?),
                    ))
                },
            )
            .optional()
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let (box_name, ciphertexts, created_at, updated_at, tags, nonces) =
            row.ok_or(VaultError::BoxNotFound(id))?;

        let fields = BoxFields {
            user_name: EncryptedField::from_columns(ciphertexts.0, tags.0, nonces.0)?,
            password: EncryptedField::from_columns(ciphertexts.1, tags.1, nonces.1)?,
            email: EncryptedField::from_columns(ciphertexts.2, tags.2, nonces.2)?,
        };

        Ok(StoredBox {
            box_id,
            tenant_id,
            box_name,
            fields,
            is_active: true,
            created_at: from_millis(created_at)?,
            updated_at: from_millis(updated_at)?,
        })
    }

    /// Creation time of an active box, without reading its field triples.
    pub fn box_created_at(&self, tenant_id: Uuid, box_id: Uuid) -> VaultResult<DateTime<Utc>> {
        let conn = self.lock()?;
        let id = box_id.to_string();
        let created_at: Option<i64> = conn
            .query_row(
                "SELECT created_at FROM password_boxes
                 WHERE box_id = ? AND tenant_id = ? AND is_active",
                params![id, tenant_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        from_millis(created_at.ok_or(VaultError::BoxNotFound(id))?)
    }

    /// Hides a box from reads and listings. Its name stays reserved.
    pub fn deactivate_box(&self, tenant_id: Uuid, box_id: Uuid) -> VaultResult<()> {
        let conn = self.lock()?;
        let id = box_id.to_string();
        let affected = conn
            .execute(
                "UPDATE password_boxes SET is_active = FALSE, updated_at = ?
                 WHERE box_id = ? AND tenant_id = ? AND is_active",
                params![Utc::now().timestamp_millis(), id, tenant_id.to_string()],
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(VaultError::BoxNotFound(id));
        }
        Ok(())
    }

    /// Deletes a box along with its tag and nonce rows.
    pub fn delete_box(&self, tenant_id: Uuid, box_id: Uuid) -> VaultResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| VaultError::Storage(e.to_string()))?;
        let id = box_id.to_string();

        let affected = tx
            .execute(
                "DELETE FROM password_boxes WHERE box_id = ? AND tenant_id = ?",
                params![id, tenant_id.to_string()],
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(VaultError::BoxNotFound(id));
        }

        for table in ["password_box_tags", "password_box_nonces"] {
            tx.execute(&format!("DELETE FROM {table} WHERE box_id = ?"), params![id])
                .map_err(|e| VaultError::Storage(e.to_string()))?;
        }

        tx.commit().map_err(|e| VaultError::Storage(e.to_string()))
    }

    /// Active boxes owned by a tenant, ordered by name.
    pub fn list_boxes(&self, tenant_id: Uuid) -> VaultResult<Vec<PasswordBoxSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT box_id, box_name, is_active, created_at, updated_at
                 FROM password_boxes WHERE tenant_id = ? AND is_active ORDER BY box_name",
            )
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        let rows: Vec<(String, String, bool, i64, i64)> = stmt
            .query_map(params![tenant_id.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .map_err(|e| VaultError::Storage(e.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|e| VaultError::Storage(e.to_string()))?;

        rows.into_iter()
            .map(|(box_id, box_name, is_active, created_at, updated_at)| {
                Ok(PasswordBoxSummary {
                    box_id: parse_id(&box_id)?,
                    box_name,
                    is_active,
                    created_at: from_millis(created_at)?,
                    updated_at: from_millis(updated_at)?,
                })
            })
            .collect()
    }
}

/// Inactive boxes still hold their name.
fn name_taken(
    conn: &Connection,
    tenant_id: Uuid,
    box_name: &str,
    except: Option<Uuid>,
) -> VaultResult<bool> {
    let except = except.map(|id| id.to_string()).unwrap_or_default();
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM password_boxes WHERE tenant_id = ? AND box_name = ? AND box_id <> ?",
            params![tenant_id.to_string(), box_name, except],
            |row| row.get(0),
        )
        .map_err(|e| VaultError::Storage(e.to_string()))?;
    Ok(count > 0)
}

fn split_columns(fields: &BoxFields) -> (Columns, Columns, Columns) {
    let [u, p, e] = SecretField::ALL.map(|field| fields.get(field).clone().into_columns());
    ((u.0, p.0, e.0), (u.1, p.1, e.1), (u.2, p.2, e.2))
}

fn parse_id(raw: &str) -> VaultResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| VaultError::Storage(format!("bad id {raw}: {e}")))
}

fn from_millis(ms: i64) -> VaultResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| VaultError::Storage(format!("bad timestamp {ms}")))
}
