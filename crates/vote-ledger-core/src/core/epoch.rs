// crates/vote-ledger-core/src/core/epoch.rs
// ============================================================================
// Module: Vote Ledger Epochs
// Description: Reward accounting windows, token amounts, and reward credits.
// Purpose: Persisted epoch and credit records backing the conservation invariant.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! An [`Epoch`] is a fixed-length accounting window with its own budget. The
//! total posted into an epoch (`distributed`) never exceeds its budget, and
//! the sum of every voter's pending plus claimed credit equals `distributed`.
//! Token amounts serialize as decimal strings so they survive JSON consumers
//! that cannot represent 128-bit integers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::core::identifiers::EpochId;
use crate::core::identifiers::VoterId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Token Amount
// ============================================================================

/// Token amount in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from base units.
    #[must_use]
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// Returns the amount in base units.
    #[must_use]
    pub const fn units(self) -> u128 {
        self.0
    }

    /// Returns true when the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TokenAmount {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse::<u128>().map(Self)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECTION: Epoch
// ============================================================================

/// Fixed-length reward accounting window.
///
/// # Invariants
/// - `distributed <= budget` and `distributed` never decreases.
/// - Once `finalized`, no credit of any kind is posted into the epoch.
/// - `remainder_distributed_at` is set in the same write that finalizes the
///   epoch, after the remainder split has been posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    /// Sequential epoch identifier.
    pub epoch_id: EpochId,
    /// Inclusive window start.
    pub start_time: Timestamp,
    /// Exclusive window end.
    pub end_time: Timestamp,
    /// Total amount that may be credited in this epoch.
    pub budget: TokenAmount,
    /// Total amount credited so far.
    pub distributed: TokenAmount,
    /// Whether the epoch has been closed.
    pub finalized: bool,
    /// When the closing remainder distribution ran, if it has.
    pub remainder_distributed_at: Option<Timestamp>,
}

impl Epoch {
    /// Returns the budget still available for crediting.
    #[must_use]
    pub const fn remaining(&self) -> TokenAmount {
        self.budget.saturating_sub(self.distributed)
    }

    /// Returns true when `now` has reached the end of the window.
    #[must_use]
    pub fn is_due(&self, now: Timestamp) -> bool {
        now >= self.end_time
    }
}

// ============================================================================
// SECTION: Reward Credit
// ============================================================================

/// Accrued reward balance for a voter within one epoch.
///
/// # Invariants
/// - `pending_amount + claimed_amount` equals everything ever posted for the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCredit {
    /// Voter receiving the credit.
    pub voter: VoterId,
    /// Epoch the credit belongs to.
    pub epoch_id: EpochId,
    /// Amount credited but not yet claimed.
    pub pending_amount: TokenAmount,
    /// Amount already transferred to the voter.
    pub claimed_amount: TokenAmount,
    /// Whether the voter has claimed from this epoch.
    pub claimed: bool,
    /// Sum of the voter's weights (bps) at each correct evaluation in the epoch.
    pub weight_points: u64,
}

impl RewardCredit {
    /// Creates an empty credit entry.
    #[must_use]
    pub const fn empty(voter: VoterId, epoch_id: EpochId) -> Self {
        Self {
            voter,
            epoch_id,
            pending_amount: TokenAmount::ZERO,
            claimed_amount: TokenAmount::ZERO,
            claimed: false,
            weight_points: 0,
        }
    }
}
