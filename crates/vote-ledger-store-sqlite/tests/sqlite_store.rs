// crates/vote-ledger-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SQLite LedgerStore behavior.
// Purpose: Ensure durable persistence, atomic rollback, and integrity checks.
// Dependencies: vote-ledger-store-sqlite, vote-ledger-core, rusqlite, tempfile, proptest
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed ledger store. Exercises
//! transaction rollback, pending-scan ordering, durability across instances,
//! and fail-closed loads when rows are tampered with.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use common::sample_credit;
use common::sample_decision;
use common::sample_epoch;
use common::store_for;
use common::ts;
use proptest::prelude::*;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;
use vote_ledger_core::DecisionId;
use vote_ledger_core::EpochId;
use vote_ledger_core::Evaluation;
use vote_ledger_core::EvaluationRecord;
use vote_ledger_core::LedgerStore;
use vote_ledger_core::Outcome;
use vote_ledger_core::PendingCursor;
use vote_ledger_core::Price;
use vote_ledger_core::PriceDirection;
use vote_ledger_core::StoreError;
use vote_ledger_core::TokenAmount;
use vote_ledger_core::VoterId;
use vote_ledger_core::VoterStats;
use vote_ledger_core::Weight;
use vote_ledger_store_sqlite::SqliteLedgerStore;
use vote_ledger_store_sqlite::SqliteStoreConfig;
use vote_ledger_store_sqlite::SqliteStoreError;

// ============================================================================
// SECTION: Round Trips
// ============================================================================

/// Verifies every table round-trips through a committed transaction.
#[test]
fn sqlite_store_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let decision = sample_decision("d-1", 1, 10);
    let stats = VoterStats::new(VoterId::new("alice"), Weight::from_bps(20_000));
    let epoch = sample_epoch(0);
    let credit = sample_credit("alice", 0, 2_250);

    store
        .transact(|tables| -> Result<(), StoreError> {
            tables.insert_decision(&decision)?;
            tables.save_voter_stats(&stats)?;
            tables.save_epoch(&epoch)?;
            tables.save_credit(&credit)
        })
        .unwrap();

    store
        .read(|tables| -> Result<(), StoreError> {
            assert_eq!(tables.decision(&decision.decision_id)?, Some(decision.clone()));
            assert_eq!(tables.voter_stats(&stats.voter)?, Some(stats.clone()));
            assert_eq!(tables.epoch(EpochId::GENESIS)?, Some(epoch.clone()));
            assert_eq!(tables.credit(&credit.voter, EpochId::GENESIS)?, Some(credit.clone()));
            assert!(tables.decision(&DecisionId::new("missing"))?.is_none());
            Ok(())
        })
        .unwrap();
}

/// Verifies committed rows survive reopening the database.
#[test]
fn sqlite_store_persists_across_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let decision = sample_decision("d-1", 1, 10);
    {
        let store = store_for(&path);
        store.transact(|tables| tables.insert_decision(&decision)).unwrap();
    }
    let reopened = store_for(&path);
    let loaded = reopened.read(|tables| tables.decision(&decision.decision_id)).unwrap();
    assert_eq!(loaded, Some(decision));
    assert_eq!(reopened.read(|tables| tables.next_decision_seq()).unwrap(), 2);
}

// ============================================================================
// SECTION: Transactions
// ============================================================================

/// Verifies an operation error rolls back every write in the transaction.
#[test]
fn sqlite_store_rolls_back_on_error() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let decision = sample_decision("d-1", 1, 10);

    let result: Result<(), StoreError> = store.transact(|tables| {
        tables.insert_decision(&decision)?;
        tables.save_epoch(&sample_epoch(0))?;
        Err(StoreError::Invalid("abort".to_string()))
    });
    assert!(result.is_err());

    store
        .read(|tables| -> Result<(), StoreError> {
            assert!(tables.decision(&decision.decision_id)?.is_none());
            assert!(tables.latest_epoch()?.is_none());
            assert_eq!(tables.next_decision_seq()?, 1);
            Ok(())
        })
        .unwrap();
}

/// Verifies reads inside a transaction observe its own writes.
#[test]
fn sqlite_store_reads_own_writes() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let seen = store
        .transact(|tables| -> Result<_, StoreError> {
            tables.save_epoch(&sample_epoch(0))?;
            tables.latest_epoch()
        })
        .unwrap();
    assert_eq!(seen.map(|epoch| epoch.epoch_id), Some(EpochId::GENESIS));
}

/// Verifies duplicate decision inserts conflict and updates need a row.
#[test]
fn sqlite_store_enforces_decision_identity() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let decision = sample_decision("d-1", 1, 10);
    store.transact(|tables| tables.insert_decision(&decision)).unwrap();

    let err = store.transact(|tables| tables.insert_decision(&decision)).unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let err = store
        .transact(|tables| tables.update_decision(&sample_decision("d-2", 2, 10)))
        .unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Scans
// ============================================================================

/// Verifies the pending scan orders by recording time then sequence, honors
/// the cutoff, limit, and cursor, and skips evaluated decisions.
#[test]
fn sqlite_store_scans_pending_in_order() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    let rows = [
        sample_decision("late", 1, 30),
        sample_decision("tie-b", 3, 20),
        sample_decision("tie-a", 2, 20),
        sample_decision("early", 4, 10),
        sample_decision("done", 5, 5),
        sample_decision("future", 6, 99),
    ];
    store
        .transact(|tables| -> Result<(), StoreError> {
            for row in &rows {
                tables.insert_decision(row)?;
            }
            let mut done = rows[4].clone();
            done.evaluation = Evaluation::Evaluated(EvaluationRecord {
                final_price: Price::from_units(120).unwrap(),
                final_price_as_of: ts(50),
                evaluated_at: ts(50),
                direction: PriceDirection::Up,
                outcome: Outcome::Correct,
            });
            tables.update_decision(&done)
        })
        .unwrap();

    let ids = |after, limit| {
        store
            .read(|tables| tables.pending_decisions(ts(30), after, limit))
            .unwrap()
            .into_iter()
            .map(|record| record.decision_id.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(None, 10), vec!["early", "tie-a", "tie-b", "late"]);
    assert_eq!(ids(None, 2), vec!["early", "tie-a"]);
    let after_tie_a = PendingCursor {
        recorded_at: ts(20),
        seq: 2,
    };
    assert_eq!(ids(Some(after_tie_a), 10), vec!["tie-b", "late"]);
    let after_late = PendingCursor::from(&rows[0]);
    assert!(ids(Some(after_late), 10).is_empty());
    assert_eq!(store.read(|tables| tables.next_decision_seq()).unwrap(), 7);
}

/// Verifies the latest epoch and epoch credit ordering.
#[test]
fn sqlite_store_orders_epochs_and_credits() {
    let temp = TempDir::new().unwrap();
    let store = store_for(&temp.path().join("ledger.sqlite"));
    store
        .transact(|tables| -> Result<(), StoreError> {
            tables.save_epoch(&sample_epoch(0))?;
            tables.save_epoch(&sample_epoch(2))?;
            tables.save_epoch(&sample_epoch(1))?;
            tables.save_credit(&sample_credit("carol", 1, 5))?;
            tables.save_credit(&sample_credit("alice", 1, 7))?;
            tables.save_credit(&sample_credit("bob", 0, 9))?;
            tables.save_credit(&sample_credit("alice", 1, 8))
        })
        .unwrap();

    let latest = store.read(|tables| tables.latest_epoch()).unwrap().unwrap();
    assert_eq!(latest.epoch_id, EpochId::new(2));
    let credits = store.read(|tables| tables.epoch_credits(EpochId::new(1))).unwrap();
    let summary: Vec<_> = credits
        .iter()
        .map(|credit| (credit.voter.to_string(), credit.pending_amount))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("alice".to_string(), TokenAmount::new(8)),
            ("carol".to_string(), TokenAmount::new(5)),
        ]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Verifies paging through pending rows with a cursor yields them sorted
    /// by time then sequence, each exactly once.
    #[test]
    fn sqlite_pending_scan_matches_sorted_order(times in prop::collection::vec(0i64 .. 8, 1 .. 12)) {
        let temp = TempDir::new().unwrap();
        let store = store_for(&temp.path().join("ledger.sqlite"));
        let rows: Vec<_> = times
            .iter()
            .enumerate()
            .map(|(index, at)| sample_decision(&format!("d-{index}"), u64::try_from(index).unwrap() + 1, *at))
            .collect();
        store
            .transact(|tables| -> Result<(), StoreError> {
                rows.iter().try_for_each(|row| tables.insert_decision(row))
            })
            .unwrap();

        let mut expected: Vec<_> = rows.iter().map(|row| (row.recorded_at, row.seq)).collect();
        expected.sort();
        let mut scanned = Vec::new();
        let mut cursor = None;
        loop {
            let page = store
                .read(|tables| tables.pending_decisions(ts(8), cursor, 3))
                .unwrap();
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(PendingCursor::from(last));
            scanned.extend(page.iter().map(|row| (row.recorded_at, row.seq)));
        }
        prop_assert_eq!(scanned, expected);
    }
}

// ============================================================================
// SECTION: Integrity
// ============================================================================

/// Verifies tampered payloads fail the hash check.
#[test]
fn sqlite_store_detects_corrupt_hash() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    let decision = sample_decision("d-1", 1, 10);
    store_for(&path).transact(|tables| tables.insert_decision(&decision)).unwrap();

    let connection = Connection::open(&path).unwrap();
    connection
        .execute(
            "UPDATE decisions SET record_hash = ?1 WHERE decision_id = ?2",
            params!["deadbeef", "d-1"],
        )
        .unwrap();
    drop(connection);

    let err = store_for(&path).read(|tables| tables.decision(&decision.decision_id)).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

/// Verifies unknown hash algorithm labels are rejected.
#[test]
fn sqlite_store_rejects_invalid_hash_algorithm() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    store_for(&path).transact(|tables| tables.save_epoch(&sample_epoch(0))).unwrap();

    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE epochs SET hash_algorithm = 'md5'", params![]).unwrap();
    drop(connection);

    let err = store_for(&path).read(|tables| tables.epoch(EpochId::GENESIS)).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

/// Verifies a row stored under the wrong key is rejected.
#[test]
fn sqlite_store_rejects_decision_id_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    store_for(&path)
        .transact(|tables| tables.insert_decision(&sample_decision("d-1", 1, 10)))
        .unwrap();

    let connection = Connection::open(&path).unwrap();
    connection
        .execute("UPDATE decisions SET decision_id = 'd-9' WHERE decision_id = 'd-1'", params![])
        .unwrap();
    drop(connection);

    let err =
        store_for(&path).read(|tables| tables.decision(&DecisionId::new("d-9"))).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

/// Verifies databases from another schema version are refused.
#[test]
fn sqlite_store_rejects_version_mismatch() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.sqlite");
    drop(store_for(&path));

    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", params![]).unwrap();
    drop(connection);

    let result = SqliteLedgerStore::new(&SqliteStoreConfig::at(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

/// Verifies a directory cannot be used as the store path.
#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let result = SqliteLedgerStore::new(&SqliteStoreConfig::at(temp.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

/// Verifies overlong path components are rejected before touching disk.
#[test]
fn sqlite_store_rejects_overlong_path_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("x".repeat(300));
    let result = SqliteLedgerStore::new(&SqliteStoreConfig::at(path));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}
