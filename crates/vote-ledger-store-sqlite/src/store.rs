// crates/vote-ledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Ledger Store
// Description: Durable LedgerStore backed by SQLite WAL.
// Purpose: Persist ledger tables with deterministic serialization.
// Dependencies: vote-ledger-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`LedgerStore`] using `SQLite`. Every
//! ledger transaction maps onto one `SQLite` transaction: the operation runs
//! against a table view bound to that transaction, which commits when the
//! operation returns `Ok` and rolls back when it returns `Err`.
//!
//! Rows are stored as canonical JSON with a content hash. Loads verify the
//! hash and fail closed on corruption. Columns used for lookups and ordering
//! (`seq`, `recorded_at`, `evaluated`) are duplicated next to the payload.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Params;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use vote_ledger_core::DEFAULT_HASH_ALGORITHM;
use vote_ledger_core::DecisionId;
use vote_ledger_core::DecisionRecord;
use vote_ledger_core::Epoch;
use vote_ledger_core::EpochId;
use vote_ledger_core::HashAlgorithm;
use vote_ledger_core::LedgerStore;
use vote_ledger_core::LedgerTables;
use vote_ledger_core::PendingCursor;
use vote_ledger_core::RewardCredit;
use vote_ledger_core::StoreError;
use vote_ledger_core::Timestamp;
use vote_ledger_core::VoterId;
use vote_ledger_core::VoterStats;
use vote_ledger_core::canonical_json_bytes;
use vote_ledger_core::hash_bytes;

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
/// Maximum serialized row size accepted by the store.
pub const MAX_ROW_BYTES: usize = 1024 * 1024;

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

/// Configuration for the `SQLite` ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
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
    /// Returns a config for `path` with default pragmas.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
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
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// A write conflicts with an existing row.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// Row payload exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "row exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err function pointer.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed ledger store with WAL support.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Hash algorithm for newly written rows.
    algorithm: HashAlgorithm,
}

impl SqliteLedgerStore {
    /// Opens an `SQLite`-backed ledger store, creating the schema on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or when an existing database has another schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            algorithm: DEFAULT_HASH_ALGORITHM,
        })
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTables) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::from(SqliteStoreError::Db("mutex poisoned".to_string())))?;
        let tx = guard.transaction().map_err(|err| StoreError::from(db_error(err)))?;
        let mut tables = SqliteTables {
            tx: &tx,
            algorithm: self.algorithm,
        };
        let value = op(&mut tables)?;
        tx.commit().map_err(|err| StoreError::from(db_error(err)))?;
        Ok(value)
    }
}

// ============================================================================
// SECTION: Table View
// ============================================================================

/// Ledger tables bound to one open `SQLite` transaction.
struct SqliteTables<'a, 'conn> {
    /// Open transaction; dropped without commit on failure.
    tx: &'a Transaction<'conn>,
    /// Hash algorithm for written rows.
    algorithm: HashAlgorithm,
}

/// Stored row payload: canonical JSON, hash value, and algorithm label.
type RawRow = (Vec<u8>, String, String);

impl SqliteTables<'_, '_> {
    /// Serializes a value to canonical JSON and hashes it.
    fn encode<T: Serialize>(&self, value: &T) -> Result<(Vec<u8>, String), SqliteStoreError> {
        let bytes =
            canonical_json_bytes(value).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if bytes.len() > MAX_ROW_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_ROW_BYTES,
                actual_bytes: bytes.len(),
            });
        }
        let digest = hash_bytes(self.algorithm, &bytes);
        Ok((bytes, digest.value))
    }

    /// Loads at most one row selected as `(json, hash, algorithm)`.
    fn load_one<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: impl Params,
        label: &str,
    ) -> Result<Option<T>, SqliteStoreError> {
        let row: Option<RawRow> = self
            .tx
            .query_row(sql, params, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()
            .map_err(db_error)?;
        row.map(|raw| decode_row(raw, label)).transpose()
    }

    /// Loads every row selected as `(json, hash, algorithm)`.
    fn load_many<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: impl Params,
        label: &str,
    ) -> Result<Vec<T>, SqliteStoreError> {
        let mut statement = self.tx.prepare(sql).map_err(db_error)?;
        let rows = statement
            .query_map(params, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(db_error)?;
        let mut out = Vec::new();
        for row in rows {
            let raw: RawRow = row.map_err(db_error)?;
            out.push(decode_row(raw, label)?);
        }
        Ok(out)
    }

    /// Returns the stored algorithm label.
    const fn algorithm_label(&self) -> &'static str {
        hash_algorithm_label(self.algorithm)
    }

    /// Loads a decision and checks the payload matches its key.
    fn load_decision(
        &self,
        decision_id: &DecisionId,
    ) -> Result<Option<DecisionRecord>, SqliteStoreError> {
        let record: Option<DecisionRecord> = self.load_one(
            "SELECT record_json, record_hash, hash_algorithm FROM decisions WHERE decision_id = ?1",
            params![decision_id.as_str()],
            decision_id.as_str(),
        )?;
        if let Some(record) = &record
            && record.decision_id != *decision_id
        {
            return Err(SqliteStoreError::Invalid(
                "decision_id mismatch between key and payload".to_string(),
            ));
        }
        Ok(record)
    }

    /// Inserts a decision row.
    fn write_new_decision(&self, record: &DecisionRecord) -> Result<(), SqliteStoreError> {
        let exists: Option<i64> = self
            .tx
            .query_row(
                "SELECT 1 FROM decisions WHERE decision_id = ?1",
                params![record.decision_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;
        if exists.is_some() {
            return Err(SqliteStoreError::Conflict(format!(
                "decision already exists: {}",
                record.decision_id
            )));
        }
        let (json, hash) = self.encode(record)?;
        self.tx
            .execute(
                "INSERT INTO decisions (decision_id, seq, recorded_at, evaluated, record_json, \
                 record_hash, hash_algorithm) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.decision_id.as_str(),
                    to_sql_int(record.seq, "seq")?,
                    record.recorded_at.as_unix_millis(),
                    record.is_evaluated(),
                    json,
                    hash,
                    self.algorithm_label()
                ],
            )
            .map_err(db_error)?;
        Ok(())
    }

    /// Replaces an existing decision row.
    fn write_decision_update(&self, record: &DecisionRecord) -> Result<(), SqliteStoreError> {
        let (json, hash) = self.encode(record)?;
        let changed = self
            .tx
            .execute(
                "UPDATE decisions SET evaluated = ?2, record_json = ?3, record_hash = ?4, \
                 hash_algorithm = ?5 WHERE decision_id = ?1",
                params![
                    record.decision_id.as_str(),
                    record.is_evaluated(),
                    json,
                    hash,
                    self.algorithm_label()
                ],
            )
            .map_err(db_error)?;
        if changed == 0 {
            return Err(SqliteStoreError::Invalid(format!(
                "decision not found for update: {}",
                record.decision_id
            )));
        }
        Ok(())
    }

    /// Reads the next decision sequence number.
    fn read_next_seq(&self) -> Result<u64, SqliteStoreError> {
        let max: Option<i64> = self
            .tx
            .query_row("SELECT MAX(seq) FROM decisions", params![], |row| row.get(0))
            .map_err(db_error)?;
        let Some(max) = max else {
            return Ok(1);
        };
        let max = u64::try_from(max)
            .map_err(|_| SqliteStoreError::Corrupt(format!("negative decision seq: {max}")))?;
        max.checked_add(1)
            .ok_or_else(|| SqliteStoreError::Corrupt("decision seq overflow".to_string()))
    }

    /// Scans pending decisions in `(recorded_at, seq)` order, resuming
    /// strictly after `after` when set.
    fn scan_pending(
        &self,
        recorded_before: Timestamp,
        after: Option<PendingCursor>,
        limit: usize,
    ) -> Result<Vec<DecisionRecord>, SqliteStoreError> {
        let limit = i64::try_from(limit)
            .map_err(|_| SqliteStoreError::Invalid("pending scan limit too large".to_string()))?;
        let (after_at, after_seq) = match after {
            Some(cursor) => (cursor.recorded_at.as_unix_millis(), to_sql_int(cursor.seq, "seq")?),
            None => (i64::MIN, -1),
        };
        self.load_many(
            "SELECT record_json, record_hash, hash_algorithm FROM decisions WHERE evaluated = 0 \
             AND recorded_at <= ?1 AND (recorded_at > ?2 OR (recorded_at = ?2 AND seq > ?3)) \
             ORDER BY recorded_at, seq LIMIT ?4",
            params![recorded_before.as_unix_millis(), after_at, after_seq, limit],
            "pending decision",
        )
    }

    /// Upserts voter statistics.
    fn write_voter_stats(&self, stats: &VoterStats) -> Result<(), SqliteStoreError> {
        let (json, hash) = self.encode(stats)?;
        self.tx
            .execute(
                "INSERT INTO voter_stats (voter, stats_json, stats_hash, hash_algorithm) VALUES \
                 (?1, ?2, ?3, ?4) ON CONFLICT(voter) DO UPDATE SET stats_json = \
                 excluded.stats_json, stats_hash = excluded.stats_hash, hash_algorithm = \
                 excluded.hash_algorithm",
                params![stats.voter.as_str(), json, hash, self.algorithm_label()],
            )
            .map_err(db_error)?;
        Ok(())
    }

    /// Upserts an epoch.
    fn write_epoch(&self, epoch: &Epoch) -> Result<(), SqliteStoreError> {
        let (json, hash) = self.encode(epoch)?;
        self.tx
            .execute(
                "INSERT INTO epochs (epoch_id, epoch_json, epoch_hash, hash_algorithm) VALUES \
                 (?1, ?2, ?3, ?4) ON CONFLICT(epoch_id) DO UPDATE SET epoch_json = \
                 excluded.epoch_json, epoch_hash = excluded.epoch_hash, hash_algorithm = \
                 excluded.hash_algorithm",
                params![epoch_key(epoch.epoch_id)?, json, hash, self.algorithm_label()],
            )
            .map_err(db_error)?;
        Ok(())
    }

    /// Upserts a reward credit.
    fn write_credit(&self, credit: &RewardCredit) -> Result<(), SqliteStoreError> {
        let (json, hash) = self.encode(credit)?;
        self.tx
            .execute(
                "INSERT INTO reward_credits (epoch_id, voter, credit_json, credit_hash, \
                 hash_algorithm) VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT(epoch_id, voter) DO \
                 UPDATE SET credit_json = excluded.credit_json, credit_hash = \
                 excluded.credit_hash, hash_algorithm = excluded.hash_algorithm",
                params![
                    epoch_key(credit.epoch_id)?,
                    credit.voter.as_str(),
                    json,
                    hash,
                    self.algorithm_label()
                ],
            )
            .map_err(db_error)?;
        Ok(())
    }
}

impl LedgerTables for SqliteTables<'_, '_> {
    fn decision(&self, decision_id: &DecisionId) -> Result<Option<DecisionRecord>, StoreError> {
        Ok(self.load_decision(decision_id)?)
    }

    fn insert_decision(&mut self, record: &DecisionRecord) -> Result<(), StoreError> {
        Ok(self.write_new_decision(record)?)
    }

    fn update_decision(&mut self, record: &DecisionRecord) -> Result<(), StoreError> {
        Ok(self.write_decision_update(record)?)
    }

    fn next_decision_seq(&self) -> Result<u64, StoreError> {
        Ok(self.read_next_seq()?)
    }

    fn pending_decisions(
        &self,
        recorded_before: Timestamp,
        after: Option<PendingCursor>,
        limit: usize,
    ) -> Result<Vec<DecisionRecord>, StoreError> {
        Ok(self.scan_pending(recorded_before, after, limit)?)
    }

    fn voter_stats(&self, voter: &VoterId) -> Result<Option<VoterStats>, StoreError> {
        Ok(self.load_one(
            "SELECT stats_json, stats_hash, hash_algorithm FROM voter_stats WHERE voter = ?1",
            params![voter.as_str()],
            voter.as_str(),
        )?)
    }

    fn save_voter_stats(&mut self, stats: &VoterStats) -> Result<(), StoreError> {
        Ok(self.write_voter_stats(stats)?)
    }

    fn epoch(&self, epoch_id: EpochId) -> Result<Option<Epoch>, StoreError> {
        Ok(self.load_one(
            "SELECT epoch_json, epoch_hash, hash_algorithm FROM epochs WHERE epoch_id = ?1",
            params![epoch_key(epoch_id)?],
            &format!("epoch {epoch_id}"),
        )?)
    }

    fn latest_epoch(&self) -> Result<Option<Epoch>, StoreError> {
        Ok(self.load_one(
            "SELECT epoch_json, epoch_hash, hash_algorithm FROM epochs ORDER BY epoch_id DESC \
             LIMIT 1",
            params![],
            "latest epoch",
        )?)
    }

    fn save_epoch(&mut self, epoch: &Epoch) -> Result<(), StoreError> {
        Ok(self.write_epoch(epoch)?)
    }

    fn credit(
        &self,
        voter: &VoterId,
        epoch_id: EpochId,
    ) -> Result<Option<RewardCredit>, StoreError> {
        Ok(self.load_one(
            "SELECT credit_json, credit_hash, hash_algorithm FROM reward_credits WHERE epoch_id \
             = ?1 AND voter = ?2",
            params![epoch_key(epoch_id)?, voter.as_str()],
            &format!("credit {voter}@{epoch_id}"),
        )?)
    }

    fn save_credit(&mut self, credit: &RewardCredit) -> Result<(), StoreError> {
        Ok(self.write_credit(credit)?)
    }

    fn epoch_credits(&self, epoch_id: EpochId) -> Result<Vec<RewardCredit>, StoreError> {
        Ok(self.load_many(
            "SELECT credit_json, credit_hash, hash_algorithm FROM reward_credits WHERE epoch_id \
             = ?1 ORDER BY voter",
            params![epoch_key(epoch_id)?],
            &format!("credits for epoch {epoch_id}"),
        )?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Verifies a stored row hash and deserializes its payload.
fn decode_row<T: DeserializeOwned>(raw: RawRow, label: &str) -> Result<T, SqliteStoreError> {
    let (bytes, hash_value, hash_algorithm) = raw;
    if bytes.len() > MAX_ROW_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_ROW_BYTES,
            actual_bytes: bytes.len(),
        });
    }
    let algorithm = parse_hash_algorithm(&hash_algorithm)?;
    let expected = hash_bytes(algorithm, &bytes);
    if expected.value != hash_value {
        return Err(SqliteStoreError::Corrupt(format!("hash mismatch for {label}")));
    }
    serde_json::from_slice(&bytes).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Converts an epoch id into its integer key.
fn epoch_key(epoch_id: EpochId) -> Result<i64, SqliteStoreError> {
    to_sql_int(epoch_id.get(), "epoch_id")
}

/// Converts an unsigned counter into an `SQLite` integer.
fn to_sql_int(value: u64, field: &str) -> Result<i64, SqliteStoreError> {
    i64::try_from(value)
        .map_err(|_| SqliteStoreError::Invalid(format!("{field} exceeds sqlite integer range")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
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
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS decisions (
                    decision_id TEXT PRIMARY KEY,
                    seq INTEGER NOT NULL UNIQUE,
                    recorded_at INTEGER NOT NULL,
                    evaluated INTEGER NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_decisions_pending
                    ON decisions (evaluated, recorded_at, seq);
                CREATE TABLE IF NOT EXISTS voter_stats (
                    voter TEXT PRIMARY KEY,
                    stats_json BLOB NOT NULL,
                    stats_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS epochs (
                    epoch_id INTEGER PRIMARY KEY,
                    epoch_json BLOB NOT NULL,
                    epoch_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS reward_credits (
                    epoch_id INTEGER NOT NULL,
                    voter TEXT NOT NULL,
                    credit_json BLOB NOT NULL,
                    credit_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL,
                    PRIMARY KEY (epoch_id, voter)
                );",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Returns the canonical hash algorithm label.
const fn hash_algorithm_label(algorithm: HashAlgorithm) -> &'static str {
    match algorithm {
        HashAlgorithm::Sha256 => "sha256",
    }
}

/// Parses a hash algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    match label {
        "sha256" => Ok(HashAlgorithm::Sha256),
        other => Err(SqliteStoreError::Invalid(format!("unsupported hash algorithm: {other}"))),
    }
}
