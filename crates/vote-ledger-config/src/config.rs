// crates/vote-ledger-config/src/config.rs
// ============================================================================
// Module: Vote Ledger Configuration
// Description: Configuration loading and validation for the vote ledger.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: vote-ledger-core, vote-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to the engine defaults; unknown
//! keys and inconsistent values fail closed.
//!
//! Once validated, the file is turned into the pieces a ledger needs: a
//! [`LedgerConfig`], a [`StaticAuthorizer`], an audit sink, a store, and a
//! price staleness guard.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use vote_ledger_core::Capability;
use vote_ledger_core::DEFAULT_BASE_REWARD;
use vote_ledger_core::DEFAULT_CHANGE_THRESHOLD_BPS;
use vote_ledger_core::DEFAULT_EPOCH_BUDGET;
use vote_ledger_core::DEFAULT_EPOCH_DURATION_MS;
use vote_ledger_core::DEFAULT_HASH_ALGORITHM;
use vote_ledger_core::DEFAULT_MAX_BATCH_SIZE;
use vote_ledger_core::DEFAULT_VALIDITY_DELAY_MS;
use vote_ledger_core::EpochSchedule;
use vote_ledger_core::FileAuditSink;
use vote_ledger_core::InMemoryLedgerStore;
use vote_ledger_core::LedgerAuditSink;
use vote_ledger_core::LedgerConfig;
use vote_ledger_core::LedgerStore;
use vote_ledger_core::LedgerTables;
use vote_ledger_core::NoopAuditSink;
use vote_ledger_core::PriceGateway;
use vote_ledger_core::PrincipalId;
use vote_ledger_core::StalenessGuard;
use vote_ledger_core::StaticAuthorizer;
use vote_ledger_core::StderrAuditSink;
use vote_ledger_core::StoreError;
use vote_ledger_core::Timestamp;
use vote_ledger_core::TokenAmount;
use vote_ledger_core::Weight;
use vote_ledger_core::WeightModel;
use vote_ledger_store_sqlite::SqliteLedgerStore;
use vote_ledger_store_sqlite::SqliteStoreConfig;
use vote_ledger_store_sqlite::SqliteStoreMode;
use vote_ledger_store_sqlite::SqliteSyncMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "vote-ledger.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "VOTE_LEDGER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of authorization grants.
pub(crate) const MAX_GRANTS: usize = 256;
/// Maximum length of a principal identifier.
pub(crate) const MAX_PRINCIPAL_LENGTH: usize = 256;
/// Maximum accepted change threshold (100%).
pub(crate) const MAX_CHANGE_THRESHOLD_BPS: u32 = 10_000;
/// Maximum accepted batch size.
pub(crate) const MAX_BATCH_SIZE_LIMIT: usize = 10_000;
/// Default busy timeout for the sqlite store (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Vote ledger configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteLedgerConfig {
    /// Evaluation timing and batching.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Voter weight model parameters.
    #[serde(default)]
    pub weights: WeightsConfig,
    /// Epoch schedule and reward sizing.
    #[serde(default)]
    pub epochs: EpochsConfig,
    /// Price gateway policy.
    #[serde(default)]
    pub price: PriceConfig,
    /// Ledger store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Capability grants.
    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

impl VoteLedgerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is `path` when given, else `VOTE_LEDGER_CONFIG`, else
    /// `vote-ledger.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evaluation.validate()?;
        self.epochs.validate()?;
        self.store.validate()?;
        self.audit.validate()?;
        self.authorization.validate()?;
        self.ledger_config()?
            .validate()
            .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Builds the engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the genesis timestamp is not
    /// valid RFC 3339.
    pub fn ledger_config(&self) -> Result<LedgerConfig, ConfigError> {
        Ok(LedgerConfig {
            validity_delay_ms: self.evaluation.validity_delay_ms,
            change_threshold_bps: self.evaluation.change_threshold_bps,
            max_batch_size: self.evaluation.max_batch_size,
            weights: self.weights.model(),
            epochs: EpochSchedule {
                duration_ms: self.epochs.duration_ms,
                budget: TokenAmount::new(self.epochs.budget),
                genesis_at: self.epochs.genesis_at()?,
            },
            base_reward: TokenAmount::new(self.epochs.base_reward),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        })
    }

    /// Builds the deny-by-default authorizer from the configured grants.
    #[must_use]
    pub fn authorizer(&self) -> StaticAuthorizer {
        self.authorization.grants.iter().fold(StaticAuthorizer::new(), |authorizer, grant| {
            authorizer
                .grant(PrincipalId::new(grant.principal.trim()), grant.capabilities.iter().copied())
        })
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit file cannot be opened.
    pub fn audit_sink(&self) -> Result<Arc<dyn LedgerAuditSink>, ConfigError> {
        self.audit.open()
    }

    /// Opens the configured ledger store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the sqlite store cannot be opened.
    pub fn open_store(&self) -> Result<ConfiguredStore, ConfigError> {
        self.store.open()
    }

    /// Wraps a price gateway with the configured staleness limit.
    ///
    /// Without `price.max_staleness_ms`, quotes of any age are accepted.
    #[must_use]
    pub fn guard_prices<G: PriceGateway>(&self, inner: G) -> StalenessGuard<G> {
        StalenessGuard::new(inner, self.price.max_staleness_ms.unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluation timing and batching configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Minimum time between recording and evaluation.
    #[serde(default = "default_validity_delay_ms")]
    pub validity_delay_ms: u64,
    /// Relative change below which a price move counts as flat.
    #[serde(default = "default_change_threshold_bps")]
    pub change_threshold_bps: u32,
    /// Upper bound on batch evaluation and batch claim sizes.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            validity_delay_ms: default_validity_delay_ms(),
            change_threshold_bps: default_change_threshold_bps(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl EvaluationConfig {
    /// Validates evaluation bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.change_threshold_bps > MAX_CHANGE_THRESHOLD_BPS {
            return Err(ConfigError::Invalid(
                "evaluation.change_threshold_bps must be at most 10000".to_string(),
            ));
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "evaluation.max_batch_size must be between 1 and {MAX_BATCH_SIZE_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Returns the default validity delay.
const fn default_validity_delay_ms() -> u64 {
    DEFAULT_VALIDITY_DELAY_MS
}

/// Returns the default change threshold.
const fn default_change_threshold_bps() -> u32 {
    DEFAULT_CHANGE_THRESHOLD_BPS
}

/// Returns the default batch size.
const fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

// ============================================================================
// SECTION: Weights
// ============================================================================

/// Voter weight model configuration in basis points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WeightsConfig {
    /// Starting and minimum weight.
    pub min_weight_bps: u64,
    /// Maximum weight.
    pub max_weight_bps: u64,
    /// Bonus granted at full accuracy.
    pub accuracy_bonus_max_bps: u64,
    /// Bonus per consecutive correct outcome.
    pub streak_bonus_step_bps: u64,
    /// Streak length at which the streak bonus stops growing.
    pub streak_bonus_cap: u64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        let model = WeightModel::default();
        Self {
            min_weight_bps: model.min_weight.bps(),
            max_weight_bps: model.max_weight.bps(),
            accuracy_bonus_max_bps: model.accuracy_bonus_max.bps(),
            streak_bonus_step_bps: model.streak_bonus_step.bps(),
            streak_bonus_cap: model.streak_bonus_cap,
        }
    }
}

impl WeightsConfig {
    /// Converts to the engine weight model.
    #[must_use]
    pub const fn model(&self) -> WeightModel {
        WeightModel {
            min_weight: Weight::from_bps(self.min_weight_bps),
            max_weight: Weight::from_bps(self.max_weight_bps),
            accuracy_bonus_max: Weight::from_bps(self.accuracy_bonus_max_bps),
            streak_bonus_step: Weight::from_bps(self.streak_bonus_step_bps),
            streak_bonus_cap: self.streak_bonus_cap,
        }
    }
}

// ============================================================================
// SECTION: Epochs
// ============================================================================

/// Epoch schedule and reward sizing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EpochsConfig {
    /// Epoch length in milliseconds.
    #[serde(default = "default_epoch_duration_ms")]
    pub duration_ms: u64,
    /// Budget per epoch in base token units.
    #[serde(default = "default_epoch_budget")]
    pub budget: u128,
    /// Credit for a correct evaluation at 1.0x weight.
    #[serde(default = "default_base_reward")]
    pub base_reward: u128,
    /// Optional RFC 3339 start of epoch 0.
    #[serde(default)]
    pub genesis: Option<String>,
}

impl Default for EpochsConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_epoch_duration_ms(),
            budget: default_epoch_budget(),
            base_reward: default_base_reward(),
            genesis: None,
        }
    }
}

impl EpochsConfig {
    /// Validates epoch settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "epochs.duration_ms must be greater than zero".to_string(),
            ));
        }
        self.genesis_at().map(|_| ())
    }

    /// Parses the configured genesis time.
    fn genesis_at(&self) -> Result<Option<Timestamp>, ConfigError> {
        self.genesis
            .as_deref()
            .map(|value| {
                Timestamp::parse_rfc3339(value.trim())
                    .map_err(|err| ConfigError::Invalid(format!("epochs.genesis: {err}")))
            })
            .transpose()
    }
}

/// Returns the default epoch duration.
const fn default_epoch_duration_ms() -> u64 {
    DEFAULT_EPOCH_DURATION_MS
}

/// Returns the default epoch budget.
const fn default_epoch_budget() -> u128 {
    DEFAULT_EPOCH_BUDGET
}

/// Returns the default base reward.
const fn default_base_reward() -> u128 {
    DEFAULT_BASE_REWARD
}

// ============================================================================
// SECTION: Price
// ============================================================================

/// Price gateway policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceConfig {
    /// Maximum accepted quote age; unlimited when unset.
    #[serde(default)]
    pub max_staleness_ms: Option<u64>,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Ledger store backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path(path)
            }
        }
    }

    /// Returns the sqlite store settings when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Opens the selected store.
    fn open(&self) -> Result<ConfiguredStore, ConfigError> {
        match self.store_type {
            StoreType::Memory => Ok(ConfiguredStore::Memory(InMemoryLedgerStore::new())),
            StoreType::Sqlite => {
                let config = self.sqlite_config().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                SqliteLedgerStore::new(&config)
                    .map(ConfiguredStore::Sqlite)
                    .map_err(|err| ConfigError::Io(err.to_string()))
            }
        }
    }
}

/// Returns the default busy timeout for the sqlite store.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Ledger store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Volatile in-memory store.
    #[default]
    Memory,
    /// Durable `SQLite` store.
    Sqlite,
}

/// Store opened from configuration.
#[derive(Clone)]
pub enum ConfiguredStore {
    /// In-memory backend.
    Memory(InMemoryLedgerStore),
    /// `SQLite` backend.
    Sqlite(SqliteLedgerStore),
}

impl LedgerStore for ConfiguredStore {
    fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTables) -> Result<T, E>,
        E: From<StoreError>,
    {
        match self {
            Self::Memory(store) => store.transact(op),
            Self::Sqlite(store) => store.transact(op),
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink type.
    #[serde(rename = "type", default)]
    pub sink: AuditSinkType,
    /// JSON lines file for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkType::File, Some(path)) => validate_path(path),
            (AuditSinkType::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }

    /// Opens the configured sink.
    fn open(&self) -> Result<Arc<dyn LedgerAuditSink>, ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkType::Noop, _) => Ok(Arc::new(NoopAuditSink)),
            (AuditSinkType::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
            (AuditSinkType::File, Some(path)) => FileAuditSink::new(path)
                .map(|sink| Arc::new(sink) as Arc<dyn LedgerAuditSink>)
                .map_err(|err| ConfigError::Io(err.to_string())),
            (AuditSinkType::File, None) => {
                Err(ConfigError::Invalid("file audit sink requires path".to_string()))
            }
        }
    }
}

/// Audit sink selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkType {
    /// Discard events.
    #[default]
    Noop,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Capability grant table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Grants by principal.
    #[serde(default)]
    pub grants: Vec<GrantConfig>,
}

impl AuthorizationConfig {
    /// Validates grant entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.grants.len() > MAX_GRANTS {
            return Err(ConfigError::Invalid(format!(
                "authorization.grants exceeds limit of {MAX_GRANTS}"
            )));
        }
        let mut seen = BTreeSet::new();
        for grant in &self.grants {
            let principal = grant.principal.trim();
            if principal.is_empty() {
                return Err(ConfigError::Invalid(
                    "authorization grant principal must be non-empty".to_string(),
                ));
            }
            if principal.len() > MAX_PRINCIPAL_LENGTH {
                return Err(ConfigError::Invalid(
                    "authorization grant principal exceeds max length".to_string(),
                ));
            }
            if !seen.insert(principal) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate authorization grant for principal: {principal}"
                )));
            }
            if grant.capabilities.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "authorization grant for {principal} lists no capabilities"
                )));
            }
        }
        Ok(())
    }
}

/// Capabilities granted to one principal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrantConfig {
    /// Principal identifier.
    pub principal: String,
    /// Granted capabilities.
    pub capabilities: Vec<Capability>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration or opening a backend.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}
