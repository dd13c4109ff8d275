// crates/vote-ledger-core/src/core/voter.rs
// ============================================================================
// Module: Vote Ledger Voter Statistics
// Description: Per-voter accuracy counters and bounded reward weight.
// Purpose: Persisted statistics consumed by the weight model and allocator.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Voter statistics are created lazily on a voter's first recorded decision
//! and only change after a correct or incorrect evaluation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::VoterId;

// ============================================================================
// SECTION: Weight
// ============================================================================

/// Basis points representing a 1.0x weight.
pub const WEIGHT_SCALE_BPS: u64 = 10_000;

/// Reward weight in basis points (`10_000` = 1.0x).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Weight(u64);

impl Weight {
    /// Creates a weight from basis points.
    #[must_use]
    pub const fn from_bps(bps: u64) -> Self {
        Self(bps)
    }

    /// Returns the weight in basis points.
    #[must_use]
    pub const fn bps(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

// ============================================================================
// SECTION: Voter Stats
// ============================================================================

/// Accuracy and streak statistics for one voter.
///
/// # Invariants
/// - `correct_decisions <= total_decisions`.
/// - `current_weight` lies within the configured weight bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterStats {
    /// Voter identifier.
    pub voter: VoterId,
    /// Count of correct plus incorrect outcomes (neutral outcomes excluded).
    pub total_decisions: u64,
    /// Count of correct outcomes.
    pub correct_decisions: u64,
    /// Consecutive correct outcomes since the last incorrect one.
    pub consecutive_correct_streak: u64,
    /// Weight applied to the voter's next reward credit.
    pub current_weight: Weight,
}

impl VoterStats {
    /// Creates fresh statistics for a voter with the given starting weight.
    #[must_use]
    pub const fn new(voter: VoterId, initial_weight: Weight) -> Self {
        Self {
            voter,
            total_decisions: 0,
            correct_decisions: 0,
            consecutive_correct_streak: 0,
            current_weight: initial_weight,
        }
    }
}
