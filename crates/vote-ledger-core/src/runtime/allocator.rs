// crates/vote-ledger-core/src/runtime/allocator.rs
// ============================================================================
// Module: Vote Ledger Epoch Allocator
// Description: Epoch scheduling, capped credit posting, and claim bookkeeping.
// Purpose: Enforce per-epoch budget conservation for every credit movement.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Every credit movement goes through this module. Posting is capped at the
//! epoch's remaining budget, so `distributed <= budget` holds no matter what
//! callers request; truncated excess is dropped. Closing an epoch splits
//! whatever budget is left in proportion to each voter's accumulated weight
//! points, rounding down, and only then marks the epoch finalized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::Epoch;
use crate::core::EpochId;
use crate::core::RewardCredit;
use crate::core::Timestamp;
use crate::core::TokenAmount;
use crate::core::VoterId;
use crate::core::WEIGHT_SCALE_BPS;
use crate::core::Weight;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default epoch length (30 days).
pub const DEFAULT_EPOCH_DURATION_MS: u64 = 30 * 24 * 60 * 60 * 1_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Allocation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Credit was posted into a finalized epoch.
    #[error("epoch {0} is finalized")]
    EpochFinalized(EpochId),
    /// Schedule parameters cannot produce an epoch window.
    #[error("invalid epoch schedule: {0}")]
    InvalidSchedule(String),
    /// Arithmetic overflow in amount bookkeeping.
    #[error("allocation overflow: {0}")]
    Overflow(String),
}

// ============================================================================
// SECTION: Schedule
// ============================================================================

/// Fixed-length epoch schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Epoch length in milliseconds.
    pub duration_ms: u64,
    /// Budget assigned to each new epoch.
    pub budget: TokenAmount,
    /// Optional fixed start of epoch 0; defaults to the first advance time.
    pub genesis_at: Option<Timestamp>,
}

impl EpochSchedule {
    /// Builds the genesis epoch.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidSchedule`] when the window overflows.
    pub fn genesis(&self, now: Timestamp) -> Result<Epoch, AllocationError> {
        self.window(EpochId::GENESIS, self.genesis_at.unwrap_or(now))
    }

    /// Builds the epoch following `current`.
    ///
    /// The successor starts at `current.end_time`; when more than one period
    /// has elapsed it is aligned to the period that contains `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] when ids or timestamps overflow.
    pub fn successor(&self, current: &Epoch, now: Timestamp) -> Result<Epoch, AllocationError> {
        let epoch_id = current
            .epoch_id
            .next()
            .ok_or_else(|| AllocationError::Overflow("epoch id exhausted".to_string()))?;
        let duration = self.checked_duration()?;
        let periods = now.millis_since(current.end_time) / duration;
        let offset = periods
            .checked_mul(duration)
            .ok_or_else(|| AllocationError::Overflow("epoch alignment".to_string()))?;
        let start = current
            .end_time
            .checked_add_millis(offset)
            .ok_or_else(|| AllocationError::Overflow("epoch start".to_string()))?;
        self.window(epoch_id, start)
    }

    /// Builds an epoch window starting at `start`.
    fn window(&self, epoch_id: EpochId, start: Timestamp) -> Result<Epoch, AllocationError> {
        let end = start
            .checked_add_millis(self.checked_duration()?)
            .ok_or_else(|| AllocationError::InvalidSchedule("epoch end overflows".to_string()))?;
        Ok(Epoch {
            epoch_id,
            start_time: start,
            end_time: end,
            budget: self.budget,
            distributed: TokenAmount::ZERO,
            finalized: false,
            remainder_distributed_at: None,
        })
    }

    /// Returns the duration, rejecting zero.
    fn checked_duration(&self) -> Result<u64, AllocationError> {
        if self.duration_ms == 0 {
            return Err(AllocationError::InvalidSchedule(
                "epoch duration must be greater than zero".to_string(),
            ));
        }
        Ok(self.duration_ms)
    }
}

// ============================================================================
// SECTION: Posting
// ============================================================================

/// Result of a capped credit posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedCredit {
    /// Amount the caller asked to post.
    pub requested: TokenAmount,
    /// Amount actually posted after the budget cap.
    pub posted: TokenAmount,
}

impl PostedCredit {
    /// Returns true when the budget cap dropped part of the request.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.posted < self.requested
    }
}

/// Posts `amount` into an open epoch for the credit's voter, capped at the
/// epoch's remaining budget.
///
/// # Errors
///
/// Returns [`AllocationError::EpochFinalized`] for finalized epochs.
pub fn post_credit(
    epoch: &mut Epoch,
    credit: &mut RewardCredit,
    amount: TokenAmount,
) -> Result<PostedCredit, AllocationError> {
    if epoch.finalized {
        return Err(AllocationError::EpochFinalized(epoch.epoch_id));
    }
    let posted = amount.min(epoch.remaining());
    epoch.distributed = epoch
        .distributed
        .checked_add(posted)
        .ok_or_else(|| AllocationError::Overflow("epoch distributed".to_string()))?;
    credit.pending_amount = credit
        .pending_amount
        .checked_add(posted)
        .ok_or_else(|| AllocationError::Overflow("pending credit".to_string()))?;
    Ok(PostedCredit {
        requested: amount,
        posted,
    })
}

/// Sizes an evaluation credit: `base_reward * weight / 1.0x`.
///
/// # Errors
///
/// Returns [`AllocationError::Overflow`] when the product does not fit.
pub fn weighted_reward(base_reward: TokenAmount, weight: Weight) -> Result<TokenAmount, AllocationError> {
    mul_div_floor(base_reward.units(), u128::from(weight.bps()), u128::from(WEIGHT_SCALE_BPS))
        .map(TokenAmount::new)
        .ok_or_else(|| AllocationError::Overflow("weighted reward".to_string()))
}

// ============================================================================
// SECTION: Remainder Distribution
// ============================================================================

/// One voter's share of a remainder distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionShare {
    /// Voter receiving the share.
    pub voter: VoterId,
    /// Weight points backing the share.
    pub weight_points: u64,
    /// Amount posted.
    pub amount: TokenAmount,
}

/// Closes an epoch: splits its remaining budget across `credits` in
/// proportion to their weight points, posts each share, then marks the
/// epoch finalized.
///
/// Rounds down; any dust stays undistributed. Credits with zero weight
/// points receive nothing.
///
/// # Errors
///
/// Returns [`AllocationError::EpochFinalized`] when the epoch is already
/// closed, or [`AllocationError::Overflow`].
pub fn distribute_remainder(
    epoch: &mut Epoch,
    credits: &mut [RewardCredit],
) -> Result<Vec<DistributionShare>, AllocationError> {
    if epoch.finalized {
        return Err(AllocationError::EpochFinalized(epoch.epoch_id));
    }
    let remainder = epoch.remaining().units();
    let total_points = credits.iter().map(|credit| u128::from(credit.weight_points)).sum::<u128>();
    let mut shares = Vec::new();
    if remainder > 0 && total_points > 0 {
        for credit in credits.iter_mut().filter(|credit| credit.weight_points > 0) {
            let share = mul_div_floor(remainder, u128::from(credit.weight_points), total_points)
                .ok_or_else(|| AllocationError::Overflow("distribution share".to_string()))?;
            let posted = post_credit(epoch, credit, TokenAmount::new(share))?;
            shares.push(DistributionShare {
                voter: credit.voter.clone(),
                weight_points: credit.weight_points,
                amount: posted.posted,
            });
        }
    }
    epoch.finalized = true;
    Ok(shares)
}

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Moves a credit's pending amount into its claimed amount.
///
/// Returns `None` when nothing is pending.
#[must_use]
pub fn settle_claim(credit: &mut RewardCredit) -> Option<TokenAmount> {
    if credit.pending_amount.is_zero() {
        return None;
    }
    let amount = credit.pending_amount;
    credit.claimed_amount = credit.claimed_amount.checked_add(amount)?;
    credit.pending_amount = TokenAmount::ZERO;
    credit.claimed = true;
    Some(amount)
}

/// Returns `amount` from a credit's claimed balance to its pending balance
/// after a payout did not happen.
///
/// # Errors
///
/// Returns [`AllocationError::Overflow`] when the credit never claimed
/// `amount` or the pending balance overflows.
pub fn reverse_claim(credit: &mut RewardCredit, amount: TokenAmount) -> Result<(), AllocationError> {
    credit.claimed_amount = credit
        .claimed_amount
        .checked_sub(amount)
        .ok_or_else(|| AllocationError::Overflow("reversed claim exceeds claimed".to_string()))?;
    credit.pending_amount = credit
        .pending_amount
        .checked_add(amount)
        .ok_or_else(|| AllocationError::Overflow("pending credit".to_string()))?;
    credit.claimed = !credit.claimed_amount.is_zero();
    Ok(())
}

// ============================================================================
// SECTION: Arithmetic
// ============================================================================

/// Computes `floor(value * numerator / denominator)` without intermediate
/// overflow when the result fits.
fn mul_div_floor(value: u128, numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    let whole = (value / denominator).checked_mul(numerator)?;
    let part = (value % denominator).checked_mul(numerator)? / denominator;
    whole.checked_add(part)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
