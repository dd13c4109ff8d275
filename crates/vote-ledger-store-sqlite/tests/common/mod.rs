// crates/vote-ledger-store-sqlite/tests/common/mod.rs
// =============================================================================
// Module: SQLite Store Test Helpers
// Description: Sample rows and store constructors for SQLite tests.
// Purpose: Reduce duplication across SQLite store suites.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::path::Path;

use vote_ledger_core::AssetId;
use vote_ledger_core::DecisionId;
use vote_ledger_core::DecisionRecord;
use vote_ledger_core::Epoch;
use vote_ledger_core::EpochId;
use vote_ledger_core::Evaluation;
use vote_ledger_core::Price;
use vote_ledger_core::ProposalId;
use vote_ledger_core::ProposalKind;
use vote_ledger_core::RewardCredit;
use vote_ledger_core::Timestamp;
use vote_ledger_core::TokenAmount;
use vote_ledger_core::VoteDirection;
use vote_ledger_core::VoterId;
use vote_ledger_store_sqlite::SqliteLedgerStore;
use vote_ledger_store_sqlite::SqliteStoreConfig;

/// Returns a timestamp from unix milliseconds.
pub fn ts(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

/// Opens a store at `path` with default pragmas.
pub fn store_for(path: &Path) -> SqliteLedgerStore {
    SqliteLedgerStore::new(&SqliteStoreConfig::at(path)).expect("store init")
}

/// Builds a pending decision row.
pub fn sample_decision(id: &str, seq: u64, recorded_at: i64) -> DecisionRecord {
    DecisionRecord {
        decision_id: DecisionId::new(id),
        seq,
        proposal_id: ProposalId::new(format!("proposal-{id}")),
        voter: VoterId::new("alice"),
        proposal_kind: ProposalKind::Invest,
        asset: AssetId::new("ETH"),
        vote: VoteDirection::Yes,
        price_at_recording: Price::from_units(100).expect("price"),
        price_as_of: ts(recorded_at),
        recorded_at: ts(recorded_at),
        evaluation: Evaluation::Pending,
    }
}

/// Builds an open epoch row.
pub fn sample_epoch(id: u64) -> Epoch {
    let start = i64::try_from(id).expect("id") * 1_000;
    Epoch {
        epoch_id: EpochId::new(id),
        start_time: ts(start),
        end_time: ts(start + 1_000),
        budget: TokenAmount::new(10_000),
        distributed: TokenAmount::ZERO,
        finalized: false,
        remainder_distributed_at: None,
    }
}

/// Builds a credit row with a pending amount.
pub fn sample_credit(voter: &str, epoch: u64, pending: u128) -> RewardCredit {
    RewardCredit {
        pending_amount: TokenAmount::new(pending),
        weight_points: 22_500,
        ..RewardCredit::empty(VoterId::new(voter), EpochId::new(epoch))
    }
}
