// crates/vote-ledger-core/tests/claims.rs
// ============================================================================
// Module: Claim and Distribution Tests
// Description: Tests for reward claims, batch claims, and remainder payouts.
// Purpose: Validate idempotent claiming and all-or-nothing custody failures.
// Dependencies: vote-ledger-core
// ============================================================================
//! ## Overview
//! Claims transfer pending credit through token custody and must leave the
//! ledger untouched when custody fails. Closing an ended epoch, by advancing
//! or by distributing, splits its leftover budget by weight points exactly
//! once.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use common::DELAY_MS;
use common::EPOCH_MS;
use common::Harness;
use common::operator;
use common::test_config;
use common::ts;
use vote_ledger_core::EpochAdvance;
use vote_ledger_core::EpochId;
use vote_ledger_core::InMemoryTreasury;
use vote_ledger_core::LedgerError;
use vote_ledger_core::SkipReason;
use vote_ledger_core::SkippedClaim;
use vote_ledger_core::TokenAmount;
use vote_ledger_core::VoterId;

fn epoch_end() -> i64 {
    i64::try_from(EPOCH_MS).unwrap()
}

fn alice() -> VoterId {
    VoterId::new("alice")
}

// ============================================================================
// SECTION: Single Claims
// ============================================================================

/// Verifies a claim pays the pending amount exactly once.
#[test]
fn claim_pays_once() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.win("p-2", "alice", 10 * DELAY_MS);
    let pending = harness.ledger.get_claimable(&alice(), EpochId::GENESIS).unwrap();
    assert_eq!(pending, TokenAmount::new(2_250 + 2_500));

    let receipt = harness.ledger.claim_rewards(&alice(), EpochId::GENESIS, ts(100)).unwrap();
    assert_eq!(receipt.amount, pending);
    assert_eq!(harness.treasury.paid_to(&alice()), pending);
    assert_eq!(harness.ledger.get_claimable(&alice(), EpochId::GENESIS).unwrap(), TokenAmount::ZERO);

    let err = harness.ledger.claim_rewards(&alice(), EpochId::GENESIS, ts(200)).unwrap_err();
    assert!(matches!(err, LedgerError::NothingToClaim(_)));
    assert!(err.is_benign());
    assert_eq!(harness.treasury.paid_to(&alice()), pending);
}

/// Verifies later credits in the same epoch remain claimable after a claim.
#[test]
fn credit_after_claim_is_claimable_again() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.ledger.claim_rewards(&alice(), EpochId::GENESIS, ts(0)).unwrap();
    harness.win("p-2", "alice", 10 * DELAY_MS);
    let receipt = harness.ledger.claim_rewards(&alice(), EpochId::GENESIS, ts(0)).unwrap();
    assert_eq!(receipt.amount, TokenAmount::new(2_500));
    assert_eq!(harness.treasury.paid_to(&alice()), TokenAmount::new(4_750));
}

/// Verifies claims against unknown or empty epochs fail.
#[test]
fn claim_requires_known_epoch_and_balance() {
    let harness = Harness::new();
    harness.open_genesis();
    let err = harness.ledger.claim_rewards(&alice(), EpochId::new(3), ts(0)).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
    let err = harness.ledger.claim_rewards(&alice(), EpochId::GENESIS, ts(0)).unwrap_err();
    assert!(matches!(err, LedgerError::NothingToClaim(_)));
}

/// Verifies a custody failure leaves the credit intact for retry.
#[test]
fn insufficient_funds_leaves_credit_intact() {
    let treasury = InMemoryTreasury::funded(TokenAmount::new(100));
    let harness = Harness::with_treasury(test_config(), treasury);
    harness.open_genesis();
    harness.win("p-1", "alice", 0);

    let err = harness.ledger.claim_rewards(&alice(), EpochId::GENESIS, ts(0)).unwrap_err();
    match err {
        LedgerError::InsufficientFunds {
            requested,
            available,
        } => {
            assert_eq!(requested, TokenAmount::new(2_250));
            assert_eq!(available, TokenAmount::new(100));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        harness.ledger.get_claimable(&alice(), EpochId::GENESIS).unwrap(),
        TokenAmount::new(2_250)
    );
    assert_eq!(harness.treasury.balance(), TokenAmount::new(100));
    assert!(!harness.audit.names().contains(&"rewards_claimed"));
}

// ============================================================================
// SECTION: Batch Claims
// ============================================================================

/// Verifies a batch claim pays several epochs in one transfer and reports skips.
#[test]
fn batch_claim_pays_and_skips() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.ledger.advance_epoch_if_due(&operator(), ts(epoch_end())).unwrap();
    harness.win("p-2", "alice", epoch_end());

    let genesis = harness.ledger.get_claimable(&alice(), EpochId::GENESIS).unwrap();
    assert_eq!(genesis, TokenAmount::new(1_000_000));

    let epochs = [EpochId::GENESIS, EpochId::new(1), EpochId::new(7), EpochId::GENESIS];
    let batch = harness.ledger.batch_claim_rewards(&alice(), &epochs, ts(epoch_end() + 1)).unwrap();
    assert_eq!(batch.claimed.len(), 2);
    assert_eq!(batch.total, TokenAmount::new(1_000_000 + 2_500));
    assert_eq!(
        batch.skipped,
        vec![
            SkippedClaim {
                epoch_id: EpochId::new(7),
                reason: SkipReason::UnknownEpoch,
            },
            SkippedClaim {
                epoch_id: EpochId::GENESIS,
                reason: SkipReason::NothingToClaim,
            },
        ]
    );
    assert_eq!(harness.treasury.paid_to(&alice()), batch.total);
    assert_eq!(harness.audit.names().iter().filter(|name| **name == "rewards_claimed").count(), 1);
}

/// Verifies a batch with nothing to claim succeeds without a transfer.
#[test]
fn empty_batch_claim_transfers_nothing() {
    let harness = Harness::new();
    harness.open_genesis();
    let batch =
        harness.ledger.batch_claim_rewards(&alice(), &[EpochId::GENESIS], ts(0)).unwrap();
    assert!(batch.claimed.is_empty());
    assert_eq!(batch.total, TokenAmount::ZERO);
    assert_eq!(harness.treasury.paid_to(&alice()), TokenAmount::ZERO);
}

/// Verifies a batch custody failure restores every epoch in the batch.
#[test]
fn batch_claim_failure_rolls_back_all_epochs() {
    let treasury = InMemoryTreasury::funded(TokenAmount::new(3_000));
    let harness = Harness::with_treasury(test_config(), treasury);
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.ledger.advance_epoch_if_due(&operator(), ts(epoch_end())).unwrap();
    harness.win("p-2", "alice", epoch_end());
    let before: Vec<_> = [EpochId::GENESIS, EpochId::new(1)]
        .into_iter()
        .map(|epoch_id| harness.ledger.get_claimable(&alice(), epoch_id).unwrap())
        .collect();

    let epochs = [EpochId::GENESIS, EpochId::new(1)];
    let err = harness.ledger.batch_claim_rewards(&alice(), &epochs, ts(epoch_end())).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    let after: Vec<_> = epochs
        .into_iter()
        .map(|epoch_id| harness.ledger.get_claimable(&alice(), epoch_id).unwrap())
        .collect();
    assert_eq!(after, before);
    assert_eq!(after[1], TokenAmount::new(2_500));
    assert_eq!(harness.treasury.balance(), TokenAmount::new(3_000));
    assert!(!harness.audit.names().contains(&"rewards_claimed"));
}

/// Verifies oversized batch claims are rejected.
#[test]
fn batch_claim_size_is_bounded() {
    let harness = Harness::new();
    harness.open_genesis();
    let epochs = vec![EpochId::GENESIS; harness.ledger.config().max_batch_size + 1];
    let err = harness.ledger.batch_claim_rewards(&alice(), &epochs, ts(0)).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)));
}

// ============================================================================
// SECTION: Remainder Distribution
// ============================================================================

/// Verifies distribution splits the remainder by weight points, closes the
/// epoch, and runs only once.
#[test]
fn distribution_is_proportional_and_single_shot() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.win("p-2", "alice", 10 * DELAY_MS);
    harness.win("p-3", "bob", 0);
    harness.lose("p-4", "carol", 0);

    let before = harness.ledger.get_epoch(EpochId::GENESIS).unwrap();
    let remainder = before.budget.units() - before.distributed.units();
    let distribution =
        harness.ledger.distribute_rewards(&operator(), EpochId::GENESIS, ts(epoch_end())).unwrap();

    let alice_points = 22_500 + 25_000;
    let bob_points = 22_500;
    let total_points = alice_points + bob_points;
    assert_eq!(distribution.shares.len(), 2);
    let share_of = |voter: &str| {
        distribution
            .shares
            .iter()
            .find(|share| share.voter == VoterId::new(voter))
            .map(|share| share.amount.units())
            .unwrap()
    };
    assert_eq!(share_of("alice"), remainder * alice_points / total_points);
    assert_eq!(share_of("bob"), remainder * bob_points / total_points);

    let after = harness.ledger.get_epoch(EpochId::GENESIS).unwrap();
    assert!(after.finalized);
    assert!(after.distributed <= after.budget);
    assert_eq!(after.remainder_distributed_at, Some(ts(epoch_end())));
    assert_eq!(
        after.distributed.units(),
        before.distributed.units() + distribution.total.units()
    );
    assert_eq!(
        harness.ledger.get_claimable(&VoterId::new("carol"), EpochId::GENESIS).unwrap(),
        TokenAmount::ZERO
    );

    let err = harness
        .ledger
        .distribute_rewards(&operator(), EpochId::GENESIS, ts(epoch_end() + 1))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyDistributed(id) if id == EpochId::GENESIS));
}

/// Verifies an epoch closed by distribution gets its successor on the next
/// advance without a second split.
#[test]
fn advance_after_distribution_only_opens_successor() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.ledger.distribute_rewards(&operator(), EpochId::GENESIS, ts(epoch_end())).unwrap();
    let closed = harness.ledger.get_epoch(EpochId::GENESIS).unwrap();

    let advance = harness.ledger.advance_epoch_if_due(&operator(), ts(epoch_end())).unwrap();
    let EpochAdvance::Opened(opened) = advance else {
        panic!("expected successor, got {advance:?}");
    };
    assert_eq!(opened.epoch_id, EpochId::new(1));
    assert_eq!(opened.start_time, closed.end_time);
    assert_eq!(harness.ledger.get_epoch(EpochId::GENESIS).unwrap(), closed);
    assert_eq!(harness.audit.names().iter().filter(|name| **name == "epoch_finalized").count(), 1);
}

/// Verifies an epoch closed by advancing cannot be distributed again.
#[test]
fn distribution_after_advance_is_rejected() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    harness.ledger.advance_epoch_if_due(&operator(), ts(epoch_end())).unwrap();
    let closed = harness.ledger.get_epoch(EpochId::GENESIS).unwrap();

    let err = harness
        .ledger
        .distribute_rewards(&operator(), EpochId::GENESIS, ts(epoch_end()))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyDistributed(_)));
    assert_eq!(harness.ledger.get_epoch(EpochId::GENESIS).unwrap(), closed);
}

/// Verifies distribution requires the epoch window to have ended.
#[test]
fn distribution_requires_ended_epoch() {
    let harness = Harness::new();
    harness.open_genesis();
    harness.win("p-1", "alice", 0);
    let err = harness.ledger.distribute_rewards(&operator(), EpochId::GENESIS, ts(0)).unwrap_err();
    assert!(matches!(err, LedgerError::EpochNotFinalized(_)));
    assert!(!harness.ledger.get_epoch(EpochId::GENESIS).unwrap().finalized);
    let err = harness.ledger.distribute_rewards(&operator(), EpochId::new(5), ts(0)).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

/// Verifies an epoch without correct outcomes distributes nothing but is closed.
#[test]
fn distribution_without_credits_is_marked_done() {
    let harness = Harness::new();
    harness.open_genesis();
    let distribution =
        harness.ledger.distribute_rewards(&operator(), EpochId::GENESIS, ts(epoch_end())).unwrap();
    assert!(distribution.shares.is_empty());
    assert!(harness.ledger.get_epoch(EpochId::GENESIS).unwrap().finalized);
    let err = harness
        .ledger
        .distribute_rewards(&operator(), EpochId::GENESIS, ts(epoch_end()))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyDistributed(_)));
}
