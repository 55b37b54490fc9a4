// crates/phoneflow-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Entity Store
// Description: Relational EntityStore adapters sharing one SQLite connection.
// Purpose: Persist inventory records with join-enriched, newest-first reads.
// Dependencies: phoneflow-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteDatabase`] opens (or creates) the database file, applies pragmas,
//! and initializes a versioned schema with one table per entity. Each
//! [`SqliteEntityStore`] runs its operations inside a transaction on the
//! shared connection.
//!
//! Foreign keys are not declared as constraints: orphaned references are
//! allowed and simply read back with a null display name, the same as in the
//! fallback store. Engine errors that mean "cannot reach the database"
//! (busy, locked, cannot open, I/O) surface as
//! [`StoreError::Unavailable`] so the gateway can fall back for that call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use phoneflow_core::Clock;
use phoneflow_core::ColumnKind;
use phoneflow_core::EntityKind;
use phoneflow_core::EntitySchema;
use phoneflow_core::EntityStore;
use phoneflow_core::FieldMap;
use phoneflow_core::PreparedFields;
use phoneflow_core::Record;
use phoneflow_core::RecordId;
use phoneflow_core::RecordSource;
use phoneflow_core::StoreError;
use phoneflow_core::SystemClock;
use phoneflow_core::interfaces::ensure_entity;
use phoneflow_core::time::from_unix_millis;
use phoneflow_core::time::truncate_to_millis;
use phoneflow_core::time::unix_millis;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::sql;

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

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
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

/// Connection parameters for the relational store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config for `path` with default tuning.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
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
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Database cannot be reached (busy, locked, unopenable).
    #[error("sqlite store unavailable: {0}")]
    Unavailable(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Unavailable(message) => Self::Unavailable(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase,
            ) => Self::Unavailable(error.to_string()),
            _ => Self::Db(error.to_string()),
        }
    }
}

/// Converts an engine error straight into a store error.
fn engine(error: rusqlite::Error) -> StoreError {
    SqliteStoreError::from(error).into()
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// Shared `SQLite` database holding every entity table.
#[derive(Clone)]
pub struct SqliteDatabase {
    /// Store configuration.
    #[allow(dead_code, reason = "Retained configuration is not yet read after open.")]
    config: SqliteStoreConfig,
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Clock used for timestamps.
    clock: Arc<dyn Clock>,
}

impl SqliteDatabase {
    /// Opens the database stamped by the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Opens the database stamped by the provided clock.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open_with_clock(
        config: SqliteStoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
            clock,
        })
    }

    /// Returns a store handle for one entity.
    #[must_use]
    pub fn store(&self, entity: EntityKind) -> SqliteEntityStore {
        SqliteEntityStore {
            database: self.clone(),
            entity,
        }
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Store("sqlite connection mutex poisoned".to_string()))
    }

    /// Returns the current instant as unix milliseconds.
    fn now_millis(&self) -> Result<i64, StoreError> {
        unix_millis(truncate_to_millis(self.clock.now()))
            .ok_or_else(|| StoreError::Invalid("clock outside timestamp range".to_string()))
    }

    /// Lists live records newest first.
    fn list_records(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError> {
        let schema = entity.schema();
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(engine)?;
        let rows = query_rows(&tx, schema, &sql::list_sql(schema), &[])?;
        tx.commit().map_err(engine)?;
        drop(guard);
        rows.into_iter().map(|row| decode_row(schema, row)).collect()
    }

    /// Fetches one live record.
    fn get_record(&self, entity: EntityKind, id: RecordId) -> Result<Record, StoreError> {
        let schema = entity.schema();
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(engine)?;
        let row = fetch_row(&tx, schema, id)?;
        tx.commit().map_err(engine)?;
        drop(guard);
        decode_row(schema, row)
    }

    /// Inserts a record and returns it enriched.
    fn create_record(&self, fields: PreparedFields) -> Result<Record, StoreError> {
        let entity = fields.entity();
        let schema = entity.schema();
        let values = fields.into_values();
        let now = self.now_millis()?;
        let mut bound: Vec<SqlValue> = schema
            .columns
            .iter()
            .map(|column| encode_value(values.get(column.name).unwrap_or(&Value::Null)))
            .collect();
        bound.push(SqlValue::Integer(now));
        bound.push(SqlValue::Integer(now));

        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(engine)?;
        ensure_unique(&tx, schema, &values, None)?;
        tx.execute(&sql::insert_sql(schema), params_from_iter(bound)).map_err(engine)?;
        let id = RecordId::new(tx.last_insert_rowid())
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let row = fetch_row(&tx, schema, id)?;
        tx.commit().map_err(engine)?;
        drop(guard);
        decode_row(schema, row)
    }

    /// Writes the supplied columns of a live record.
    fn update_record(
        &self,
        entity: EntityKind,
        id: RecordId,
        fields: PreparedFields,
    ) -> Result<Record, StoreError> {
        let schema = entity.schema();
        let values = fields.into_values();
        let now = self.now_millis()?;
        let names: Vec<&str> = schema
            .columns
            .iter()
            .filter(|column| values.contains_key(column.name))
            .map(|column| column.name)
            .collect();
        let mut bound: Vec<SqlValue> = names
            .iter()
            .map(|name| encode_value(values.get(*name).unwrap_or(&Value::Null)))
            .collect();
        bound.push(SqlValue::Integer(now));
        bound.push(SqlValue::Integer(id.get()));

        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(engine)?;
        ensure_live(&tx, schema, id)?;
        ensure_unique(&tx, schema, &values, Some(id))?;
        tx.execute(&sql::update_sql(schema, &names), params_from_iter(bound)).map_err(engine)?;
        let row = fetch_row(&tx, schema, id)?;
        tx.commit().map_err(engine)?;
        drop(guard);
        decode_row(schema, row)
    }

    /// Removes or flags a live record.
    fn delete_record(&self, entity: EntityKind, id: RecordId) -> Result<(), StoreError> {
        let schema = entity.schema();
        let now = self.now_millis()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(engine)?;
        let statement = sql::delete_sql(schema);
        let affected = if schema.soft_delete_flag().is_some() {
            tx.execute(&statement, params![now, id.get()])
        } else {
            tx.execute(&statement, params![id.get()])
        }
        .map_err(engine)?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                entity,
                id,
            });
        }
        tx.commit().map_err(engine)?;
        drop(guard);
        Ok(())
    }
}

impl RecordSource for SqliteDatabase {
    fn records(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError> {
        self.list_records(entity)
    }
}

// ============================================================================
// SECTION: Entity Store Handle
// ============================================================================

/// Entity store view over a shared [`SqliteDatabase`].
#[derive(Clone)]
pub struct SqliteEntityStore {
    /// Shared database.
    database: SqliteDatabase,
    /// Entity served by this handle.
    entity: EntityKind,
}

impl EntityStore for SqliteEntityStore {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.database.list_records(self.entity)
    }

    fn get(&self, id: RecordId) -> Result<Record, StoreError> {
        self.database.get_record(self.entity, id)
    }

    fn create(&self, fields: PreparedFields) -> Result<Record, StoreError> {
        ensure_entity(self.entity, &fields)?;
        self.database.create_record(fields)
    }

    fn update(&self, id: RecordId, fields: PreparedFields) -> Result<Record, StoreError> {
        ensure_entity(self.entity, &fields)?;
        self.database.update_record(self.entity, id, fields)
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        self.database.delete_record(self.entity, id)
    }
}

// ============================================================================
// SECTION: Row Codec
// ============================================================================

/// Raw select row before JSON decoding.
struct RawRow {
    /// Row identifier.
    id: i64,
    /// Creation instant in unix milliseconds.
    created_at: i64,
    /// Update instant in unix milliseconds.
    updated_at: i64,
    /// Declared columns followed by join display columns.
    values: Vec<SqlValue>,
}

/// Runs a select and collects raw rows.
fn query_rows(
    tx: &Transaction<'_>,
    schema: &EntitySchema,
    statement: &str,
    bound: &[SqlValue],
) -> Result<Vec<RawRow>, StoreError> {
    let width = schema.columns.len() + schema.joins.len();
    let mut prepared = tx.prepare(statement).map_err(engine)?;
    let rows = prepared
        .query_map(params_from_iter(bound.iter()), |row| {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(row.get::<_, SqlValue>(sql::LEADING_COLUMNS + index)?);
            }
            Ok(RawRow {
                id: row.get(0)?,
                created_at: row.get(1)?,
                updated_at: row.get(2)?,
                values,
            })
        })
        .map_err(engine)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(engine)
}

/// Fetches one live raw row or reports not found.
fn fetch_row(
    tx: &Transaction<'_>,
    schema: &EntitySchema,
    id: RecordId,
) -> Result<RawRow, StoreError> {
    query_rows(tx, schema, &sql::get_sql(schema), &[SqlValue::Integer(id.get())])?
        .into_iter()
        .next()
        .ok_or(StoreError::NotFound {
            entity: schema.entity,
            id,
        })
}

/// Fails with not found unless the id names a live row.
fn ensure_live(tx: &Transaction<'_>, schema: &EntitySchema, id: RecordId) -> Result<(), StoreError> {
    let found: Option<i64> = tx
        .query_row(&sql::exists_sql(schema), params![id.get()], |row| row.get(0))
        .optional()
        .map_err(engine)?;
    if found.is_none() {
        return Err(StoreError::NotFound {
            entity: schema.entity,
            id,
        });
    }
    Ok(())
}

/// Rejects values colliding with a unique column on another live row.
fn ensure_unique(
    tx: &Transaction<'_>,
    schema: &EntitySchema,
    values: &FieldMap,
    exclude: Option<RecordId>,
) -> Result<(), StoreError> {
    let excluded = exclude.map_or(0, RecordId::get);
    for column in schema.columns.iter().filter(|column| column.unique) {
        let Some(candidate) = values.get(column.name).filter(|value| !value.is_null()) else {
            continue;
        };
        let collision: Option<i64> = tx
            .query_row(
                &sql::unique_probe_sql(schema, column.name),
                params![encode_value(candidate), excluded],
                |row| row.get(0),
            )
            .optional()
            .map_err(engine)?;
        if collision.is_some() {
            return Err(StoreError::Duplicate {
                entity: schema.entity,
                field: column.name.to_string(),
            });
        }
    }
    Ok(())
}

/// Converts a prepared JSON value into an `SQLite` value.
fn encode_value(value: &Value) -> SqlValue {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => number.as_i64().map_or_else(
            || number.as_f64().map_or(SqlValue::Null, SqlValue::Real),
            SqlValue::Integer,
        ),
        Value::String(text) => SqlValue::Text(text.clone()),
    }
}

/// Converts a stored value back into JSON for a column kind.
fn decode_value(kind: Option<ColumnKind>, value: SqlValue) -> Result<Value, StoreError> {
    Ok(match (kind, value) {
        (_, SqlValue::Null) => Value::Null,
        (Some(ColumnKind::Bool), SqlValue::Integer(flag)) => Value::Bool(flag != 0),
        (Some(ColumnKind::Decimal), SqlValue::Integer(amount)) => {
            Value::from(decimal_from_integer(amount))
        }
        (_, SqlValue::Integer(number)) => Value::from(number),
        (_, SqlValue::Real(amount)) => Value::from(amount),
        (_, SqlValue::Text(text)) => Value::String(text),
        (_, SqlValue::Blob(_)) => {
            return Err(StoreError::Invalid("unexpected blob column value".to_string()));
        }
    })
}

/// Widens an integral amount stored in a decimal column.
#[allow(clippy::cast_precision_loss, reason = "Stored amounts are far below 2^53.")]
const fn decimal_from_integer(amount: i64) -> f64 {
    amount as f64
}

/// Decodes a raw row into a record.
fn decode_row(schema: &EntitySchema, row: RawRow) -> Result<Record, StoreError> {
    let id = RecordId::new(row.id).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    let created_at = from_unix_millis(row.created_at)
        .ok_or_else(|| StoreError::Corrupt(format!("invalid created_at for {id}")))?;
    let updated_at = from_unix_millis(row.updated_at)
        .ok_or_else(|| StoreError::Corrupt(format!("invalid updated_at for {id}")))?;
    let names = schema
        .columns
        .iter()
        .map(|column| (column.name, Some(column.kind)))
        .chain(schema.joins.iter().map(|join| (join.alias, None)));
    let mut fields = FieldMap::new();
    for ((name, kind), value) in names.zip(row.values) {
        fields.insert(name.to_string(), decode_value(kind, value)?);
    }
    Ok(Record {
        id,
        fields,
        created_at,
        updated_at,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
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
    let connection = Connection::open_with_flags(&config.path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas for durability and contention.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection.execute_batch(&format!(
        "PRAGMA journal_mode = {};",
        config.journal_mode.pragma_value()
    ))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            for entity in EntityKind::ALL {
                tx.execute_batch(&sql::create_table_sql(entity.schema()))?;
            }
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}
