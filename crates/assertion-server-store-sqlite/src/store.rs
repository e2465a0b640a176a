// crates/assertion-server-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Attribute Store
// Description: Durable AttributeStore and CredentialChecker backed by SQLite.
// Purpose: Persist attribute definitions, value records, and account
//          credentials for the attribute authority.
// Dependencies: assertion-server-core, rusqlite, serde, serde_json, sha2,
//               subtle, rand, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`AttributeStore`] and
//! [`CredentialChecker`] using `SQLite`. Definitions are keyed on the
//! source-of-authority name, attribute identifier, and data type; value rows
//! carry no uniqueness constraint, matching the authority's own duplicate
//! handling. Deleting a definition removes its value rows in the same
//! transaction. Account credentials are stored as salted SHA-256 digests and
//! compared in constant time. Database contents are untrusted; loads fail
//! closed on malformed rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use assertion_server_core::AttributeDefinition;
use assertion_server_core::AttributeId;
use assertion_server_core::AttributeStore;
use assertion_server_core::AttributeValueRecord;
use assertion_server_core::CredentialChecker;
use assertion_server_core::CredentialError;
use assertion_server_core::DataType;
use assertion_server_core::DefinitionKey;
use assertion_server_core::NameId;
use assertion_server_core::StoreError;
use assertion_server_core::ValueQuery;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Credential salt length in bytes.
const SALT_BYTES: usize = 16;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` attribute store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default pragmas for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding attribute values or credential material.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
        }
    }
}

impl From<SqliteStoreError> for CredentialError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Backend(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed attribute store and credential checker.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - Definition deletion and value cascade commit in one transaction.
#[derive(Clone)]
pub struct SqliteAttributeStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteAttributeStore {
    /// Opens an `SQLite`-backed attribute store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite mutex poisoned".to_string()))
    }

    /// Creates or replaces an account with a salted credential digest.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the insert fails.
    pub fn create_account(&self, login: &str, token: &[u8]) -> Result<(), SqliteStoreError> {
        if login.is_empty() {
            return Err(SqliteStoreError::Invalid("account login must not be empty".to_string()));
        }
        let salt: [u8; SALT_BYTES] = rand::random();
        let digest = credential_digest(&salt, token);
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR REPLACE INTO accounts (login, salt, digest) VALUES (?1, ?2, ?3)",
                params![login, salt.as_slice(), digest.as_slice()],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Deletes an account. Deleting a missing account is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the delete fails.
    pub fn delete_account(&self, login: &str) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute("DELETE FROM accounts WHERE login = ?1", params![login])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Checks an account credential against the stored digest.
    fn check_credential(&self, login: &str, token: &[u8]) -> Result<bool, SqliteStoreError> {
        let guard = self.lock()?;
        let row: Option<(Vec<u8>, Vec<u8>)> = guard
            .query_row(
                "SELECT salt, digest FROM accounts WHERE login = ?1",
                params![login],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        let Some((salt, stored)) = row else {
            return Ok(false);
        };
        let computed = credential_digest(&salt, token);
        Ok(computed.as_slice().ct_eq(stored.as_slice()).into())
    }
}

impl AttributeStore for SqliteAttributeStore {
    fn find_definitions(&self, key: &DefinitionKey) -> Result<Vec<AttributeDefinition>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let mut stmt = guard
            .prepare(
                "SELECT soa_json, attribute_id, data_type, allowed_values FROM \
                 attribute_definitions WHERE soa = ?1 AND attribute_id = ?2 AND data_type = ?3",
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(
                params![key.soa, key.attribute_id.as_str(), key.data_type.as_str()],
                |row| {
                    let soa_json: String = row.get(0)?;
                    let attribute_id: String = row.get(1)?;
                    let data_type: String = row.get(2)?;
                    let allowed_values: String = row.get(3)?;
                    Ok((soa_json, attribute_id, data_type, allowed_values))
                },
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            let (soa_json, attribute_id, data_type, allowed_values) =
                row.map_err(|err| StoreError::Store(err.to_string()))?;
            results.push(build_definition(&soa_json, attribute_id, data_type, &allowed_values)?);
        }
        Ok(results)
    }

    fn insert_definition(&self, definition: &AttributeDefinition) -> Result<(), StoreError> {
        let key = definition.key();
        let soa_json = serde_json::to_string(&definition.soa)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let allowed_values = serde_json::to_string(&definition.allowed_values)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT OR REPLACE INTO attribute_definitions (soa, attribute_id, data_type, \
                 soa_json, allowed_values) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key.soa,
                    key.attribute_id.as_str(),
                    key.data_type.as_str(),
                    soa_json,
                    allowed_values
                ],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn delete_definition(&self, key: &DefinitionKey) -> Result<(), StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::Store(err.to_string()))?;
        tx.execute(
            "DELETE FROM attribute_values WHERE soa = ?1 AND attribute_id = ?2 AND data_type = ?3",
            params![key.soa, key.attribute_id.as_str(), key.data_type.as_str()],
        )
        .map_err(|err| StoreError::Store(err.to_string()))?;
        tx.execute(
            "DELETE FROM attribute_definitions WHERE soa = ?1 AND attribute_id = ?2 AND \
             data_type = ?3",
            params![key.soa, key.attribute_id.as_str(), key.data_type.as_str()],
        )
        .map_err(|err| StoreError::Store(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn find_values(&self, query: &ValueQuery) -> Result<Vec<AttributeValueRecord>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let (sql, bindings): (&str, Vec<&str>) = match query {
            ValueQuery::BySubject {
                subject,
            } => (
                "SELECT subject, soa, attribute_id, data_type, value FROM attribute_values WHERE \
                 subject = ?1",
                vec![subject.as_str()],
            ),
            ValueQuery::ByAttribute {
                soa,
                attribute_id,
                data_type,
            } => (
                "SELECT subject, soa, attribute_id, data_type, value FROM attribute_values WHERE \
                 soa = ?1 AND attribute_id = ?2 AND data_type = ?3",
                vec![soa.as_str(), attribute_id.as_str(), data_type.as_str()],
            ),
            ValueQuery::BySubjectAttribute {
                subject,
                soa,
                attribute_id,
                data_type,
            } => (
                "SELECT subject, soa, attribute_id, data_type, value FROM attribute_values WHERE \
                 subject = ?1 AND soa = ?2 AND attribute_id = ?3 AND data_type = ?4",
                vec![subject.as_str(), soa.as_str(), attribute_id.as_str(), data_type.as_str()],
            ),
        };
        let mut stmt = guard.prepare(sql).map_err(|err| StoreError::Store(err.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(bindings), |row| {
                let subject: String = row.get(0)?;
                let soa: String = row.get(1)?;
                let attribute_id: String = row.get(2)?;
                let data_type: String = row.get(3)?;
                let value: String = row.get(4)?;
                Ok(AttributeValueRecord {
                    subject,
                    soa,
                    attribute_id: AttributeId::new(attribute_id),
                    data_type: DataType::new(data_type),
                    value,
                })
            })
            .map_err(|err| StoreError::Store(err.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|err| StoreError::Store(err.to_string()))?);
        }
        Ok(results)
    }

    fn insert_value(&self, record: &AttributeValueRecord) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT INTO attribute_values (subject, soa, attribute_id, data_type, value) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.subject,
                    record.soa,
                    record.attribute_id.as_str(),
                    record.data_type.as_str(),
                    record.value
                ],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn update_value(&self, old: &AttributeValueRecord, new_value: &str) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "UPDATE attribute_values SET value = ?1 WHERE subject = ?2 AND soa = ?3 AND \
                 attribute_id = ?4 AND data_type = ?5 AND value = ?6",
                params![
                    new_value,
                    old.subject,
                    old.soa,
                    old.attribute_id.as_str(),
                    old.data_type.as_str(),
                    old.value
                ],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn delete_value(&self, record: &AttributeValueRecord) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "DELETE FROM attribute_values WHERE subject = ?1 AND soa = ?2 AND attribute_id = \
                 ?3 AND data_type = ?4 AND value = ?5",
                params![
                    record.subject,
                    record.soa,
                    record.attribute_id.as_str(),
                    record.data_type.as_str(),
                    record.value
                ],
            )
            .map_err(|err| StoreError::Store(err.to_string()))?;
        Ok(())
    }
}

impl CredentialChecker for SqliteAttributeStore {
    fn authenticate(&self, identity: &str, token: &[u8]) -> Result<bool, CredentialError> {
        self.check_credential(identity, token).map_err(CredentialError::from)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an attribute definition from stored row components.
fn build_definition(
    soa_json: &str,
    attribute_id: String,
    data_type: String,
    allowed_values: &str,
) -> Result<AttributeDefinition, StoreError> {
    let soa: NameId =
        serde_json::from_str(soa_json).map_err(|err| StoreError::Invalid(err.to_string()))?;
    let allowed: BTreeSet<String> =
        serde_json::from_str(allowed_values).map_err(|err| StoreError::Invalid(err.to_string()))?;
    Ok(AttributeDefinition::new(
        soa,
        AttributeId::new(attribute_id),
        DataType::new(data_type),
        allowed,
    ))
}

/// Computes the salted SHA-256 credential digest.
fn credential_digest(salt: &[u8], token: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(token);
    hasher.finalize().into()
}

/// Ensures the parent directory of the store path exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS attribute_definitions (
                    soa TEXT NOT NULL,
                    attribute_id TEXT NOT NULL,
                    data_type TEXT NOT NULL,
                    soa_json TEXT NOT NULL,
                    allowed_values TEXT NOT NULL,
                    PRIMARY KEY (soa, attribute_id, data_type)
                );
                CREATE TABLE IF NOT EXISTS attribute_values (
                    subject TEXT NOT NULL,
                    soa TEXT NOT NULL,
                    attribute_id TEXT NOT NULL,
                    data_type TEXT NOT NULL,
                    value TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_attribute_values_subject
                    ON attribute_values (subject);
                CREATE INDEX IF NOT EXISTS idx_attribute_values_attribute
                    ON attribute_values (soa, attribute_id, data_type);
                CREATE TABLE IF NOT EXISTS accounts (
                    login TEXT PRIMARY KEY,
                    salt BLOB NOT NULL,
                    digest BLOB NOT NULL
                );",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {found}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
