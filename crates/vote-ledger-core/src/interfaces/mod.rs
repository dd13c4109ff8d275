// crates/vote-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Vote Ledger Interfaces
// Description: Backend-agnostic interfaces for prices, custody, access, and storage.
// Purpose: Define the contract surfaces used by the ledger runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the ledger integrates with external systems without
//! embedding backend-specific details. Collaborators are synchronous; the
//! price gateway and token custody are the only calls that leave the process
//! boundary, and their failures abort the enclosing operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AssetId;
use crate::core::DecisionId;
use crate::core::DecisionRecord;
use crate::core::Epoch;
use crate::core::EpochId;
use crate::core::PriceQuote;
use crate::core::PrincipalId;
use crate::core::RewardCredit;
use crate::core::Timestamp;
use crate::core::TokenAmount;
use crate::core::VoterId;
use crate::core::VoterStats;

// ============================================================================
// SECTION: Price Gateway
// ============================================================================

/// Price gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The gateway does not serve the asset.
    #[error("asset unsupported: {0}")]
    AssetUnsupported(String),
    /// The gateway could not produce a price right now.
    #[error("price unavailable: {0}")]
    Unavailable(String),
    /// The quote is older than the configured staleness limit.
    #[error("price for {asset} is stale: {age_ms}ms old (max {max_age_ms}ms)")]
    Stale {
        /// Asset identifier.
        asset: String,
        /// Quote age in milliseconds.
        age_ms: u64,
        /// Maximum accepted age in milliseconds.
        max_age_ms: u64,
    },
}

/// Point-in-time price source.
pub trait PriceGateway {
    /// Returns the current price of `asset`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] when the asset is unknown or no price is available.
    fn price(&self, asset: &AssetId, now: Timestamp) -> Result<PriceQuote, PriceError>;
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Capabilities gating mutating ledger operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Record decisions on behalf of the proposal/vote source.
    RecordDecision,
    /// Evaluate pending decisions.
    Evaluate,
    /// Close and open epochs.
    AdvanceEpoch,
    /// Run remainder distribution for finalized epochs.
    Distribute,
}

impl Capability {
    /// Returns a stable label for the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordDecision => "record_decision",
            Self::Evaluate => "evaluate",
            Self::AdvanceEpoch => "advance_epoch",
            Self::Distribute => "distribute",
        }
    }
}

/// Capability check performed before any mutation.
pub trait Authorizer {
    /// Returns true when `principal` holds `capability`.
    fn is_authorized(&self, principal: &PrincipalId, capability: Capability) -> bool;
}

// ============================================================================
// SECTION: Token Custody
// ============================================================================

/// Token custody errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// Custody balance cannot cover the transfer.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Requested amount.
        requested: TokenAmount,
        /// Available balance.
        available: TokenAmount,
    },
    /// Transfer failed for another reason.
    #[error("transfer failed: {0}")]
    Transfer(String),
}

/// Token custody collaborator used to pay out claims.
///
/// Implementations must either fully complete or fully fail a transfer. The
/// ledger calls `transfer` only after the claim has committed and restores
/// the settled credit when the transfer fails, so a process crash between
/// commit and transfer leaves a claimed but unpaid credit to reconcile
/// rather than a double payout.
pub trait TokenCustody {
    /// Transfers `amount` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError`] when the transfer does not happen.
    fn transfer(&self, to: &VoterId, amount: TokenAmount) -> Result<(), CustodyError>;
}

// ============================================================================
// SECTION: Ledger Store
// ============================================================================

/// Ledger store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("ledger store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("ledger store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("ledger store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("ledger store invalid data: {0}")]
    Invalid(String),
    /// A write conflicts with an existing row.
    #[error("ledger store conflict: {0}")]
    Conflict(String),
    /// Generic store error.
    #[error("ledger store error: {0}")]
    Store(String),
}

/// Position in the pending-decision scan order.
///
/// Scans that take a cursor resume strictly after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PendingCursor {
    /// Recording time of the last decision seen.
    pub recorded_at: Timestamp,
    /// Sequence number of the last decision seen.
    pub seq: u64,
}

impl From<&DecisionRecord> for PendingCursor {
    fn from(record: &DecisionRecord) -> Self {
        Self {
            recorded_at: record.recorded_at,
            seq: record.seq,
        }
    }
}

/// Table view handed to one ledger transaction.
///
/// All reads observe writes made earlier in the same transaction.
pub trait LedgerTables {
    /// Loads a decision by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn decision(&self, decision_id: &DecisionId) -> Result<Option<DecisionRecord>, StoreError>;

    /// Inserts a new decision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the id already exists.
    fn insert_decision(&mut self, record: &DecisionRecord) -> Result<(), StoreError>;

    /// Replaces an existing decision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the decision does not exist.
    fn update_decision(&mut self, record: &DecisionRecord) -> Result<(), StoreError>;

    /// Returns the sequence number for the next recorded decision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn next_decision_seq(&self) -> Result<u64, StoreError>;

    /// Returns pending decisions recorded at or before `recorded_before`,
    /// ordered by `(recorded_at, seq)`, up to `limit` entries. When `after`
    /// is set, only decisions ordered after the cursor are returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    fn pending_decisions(
        &self,
        recorded_before: Timestamp,
        after: Option<PendingCursor>,
        limit: usize,
    ) -> Result<Vec<DecisionRecord>, StoreError>;

    /// Loads voter statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn voter_stats(&self, voter: &VoterId) -> Result<Option<VoterStats>, StoreError>;

    /// Inserts or replaces voter statistics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save_voter_stats(&mut self, stats: &VoterStats) -> Result<(), StoreError>;

    /// Loads an epoch by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn epoch(&self, epoch_id: EpochId) -> Result<Option<Epoch>, StoreError>;

    /// Loads the epoch with the highest id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn latest_epoch(&self) -> Result<Option<Epoch>, StoreError>;

    /// Inserts or replaces an epoch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save_epoch(&mut self, epoch: &Epoch) -> Result<(), StoreError>;

    /// Loads the credit for `(voter, epoch_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn credit(
        &self,
        voter: &VoterId,
        epoch_id: EpochId,
    ) -> Result<Option<RewardCredit>, StoreError>;

    /// Inserts or replaces a credit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn save_credit(&mut self, credit: &RewardCredit) -> Result<(), StoreError>;

    /// Returns all credits for an epoch ordered by voter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    fn epoch_credits(&self, epoch_id: EpochId) -> Result<Vec<RewardCredit>, StoreError>;
}

/// Transactional ledger store.
///
/// Every public ledger operation runs inside exactly one [`LedgerStore::transact`]
/// call. Implementations commit only when the operation returns `Ok`; an `Err`
/// leaves the store untouched.
pub trait LedgerStore {
    /// Runs `op` as one atomic, serialized transaction.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or a [`StoreError`] converted into `E`
    /// when the transaction cannot begin or commit.
    fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTables) -> Result<T, E>,
        E: From<StoreError>;

    /// Runs a read-only operation against a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns the operation's error or a converted [`StoreError`].
    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn LedgerTables) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.transact(|tables| op(&*tables))
    }
}
