// crates/vote-ledger-core/src/runtime/weights.rs
// ============================================================================
// Module: Vote Ledger Weight Model
// Description: Accuracy and streak driven reward weights.
// Purpose: Update voter statistics after an outcome and derive a bounded weight.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! `weight = clamp(min + accuracy_bonus + streak_bonus, min, max)` where the
//! accuracy bonus scales linearly with `correct / total` and the streak bonus
//! grows by a fixed step per consecutive correct outcome up to a cap. Both
//! terms are monotone, so weight never drops below `min`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::Outcome;
use crate::core::VoterStats;
use crate::core::WEIGHT_SCALE_BPS;
use crate::core::Weight;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default minimum weight (1.0x).
pub const DEFAULT_MIN_WEIGHT_BPS: u64 = WEIGHT_SCALE_BPS;
/// Default maximum weight (3.0x).
pub const DEFAULT_MAX_WEIGHT_BPS: u64 = 3 * WEIGHT_SCALE_BPS;
/// Default accuracy bonus at 100% accuracy (+1.0x).
pub const DEFAULT_ACCURACY_BONUS_BPS: u64 = WEIGHT_SCALE_BPS;
/// Default streak bonus per consecutive correct outcome (+0.25x).
pub const DEFAULT_STREAK_STEP_BPS: u64 = 2_500;
/// Default streak length at which the streak bonus stops growing.
pub const DEFAULT_STREAK_CAP: u64 = 4;

// ============================================================================
// SECTION: Weight Model
// ============================================================================

/// Parameters of the voter weight model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightModel {
    /// Lower weight bound (also the starting weight).
    pub min_weight: Weight,
    /// Upper weight bound.
    pub max_weight: Weight,
    /// Bonus granted at 100% accuracy.
    pub accuracy_bonus_max: Weight,
    /// Bonus per consecutive correct outcome.
    pub streak_bonus_step: Weight,
    /// Streak length at which the streak bonus stops growing.
    pub streak_bonus_cap: u64,
}

impl Default for WeightModel {
    fn default() -> Self {
        Self {
            min_weight: Weight::from_bps(DEFAULT_MIN_WEIGHT_BPS),
            max_weight: Weight::from_bps(DEFAULT_MAX_WEIGHT_BPS),
            accuracy_bonus_max: Weight::from_bps(DEFAULT_ACCURACY_BONUS_BPS),
            streak_bonus_step: Weight::from_bps(DEFAULT_STREAK_STEP_BPS),
            streak_bonus_cap: DEFAULT_STREAK_CAP,
        }
    }
}

impl WeightModel {
    /// Validates model bounds.
    ///
    /// # Errors
    ///
    /// Returns a message when the bounds are inconsistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_weight.bps() == 0 {
            return Err("min_weight must be greater than zero".to_string());
        }
        if self.min_weight > self.max_weight {
            return Err("min_weight must not exceed max_weight".to_string());
        }
        Ok(())
    }

    /// Returns the bonus earned for `correct` out of `total` outcomes.
    #[must_use]
    pub fn accuracy_bonus(&self, correct: u64, total: u64) -> u64 {
        if total == 0 {
            return 0;
        }
        let scaled = u128::from(self.accuracy_bonus_max.bps()) * u128::from(correct.min(total))
            / u128::from(total);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// Returns the bonus earned for a streak of `streak` correct outcomes.
    #[must_use]
    pub fn streak_bonus(&self, streak: u64) -> u64 {
        self.streak_bonus_step.bps().saturating_mul(streak.min(self.streak_bonus_cap))
    }

    /// Computes the clamped weight for the given counters.
    #[must_use]
    pub fn weight_for(&self, correct: u64, total: u64, streak: u64) -> Weight {
        let raw = self
            .min_weight
            .bps()
            .saturating_add(self.accuracy_bonus(correct, total))
            .saturating_add(self.streak_bonus(streak));
        Weight::from_bps(raw.clamp(self.min_weight.bps(), self.max_weight.bps()))
    }

    /// Applies an outcome to voter statistics.
    ///
    /// Returns `false` for neutral outcomes, which leave statistics untouched.
    pub fn apply(&self, stats: &mut VoterStats, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Neutral => return false,
            Outcome::Correct => {
                stats.total_decisions = stats.total_decisions.saturating_add(1);
                stats.correct_decisions = stats.correct_decisions.saturating_add(1);
                stats.consecutive_correct_streak =
                    stats.consecutive_correct_streak.saturating_add(1);
            }
            Outcome::Incorrect => {
                stats.total_decisions = stats.total_decisions.saturating_add(1);
                stats.consecutive_correct_streak = 0;
            }
        }
        stats.current_weight = self.weight_for(
            stats.correct_decisions,
            stats.total_decisions,
            stats.consecutive_correct_streak,
        );
        true
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VoterId;

    #[test]
    fn weight_starts_at_minimum() {
        let model = WeightModel::default();
        assert_eq!(model.weight_for(0, 0, 0), model.min_weight);
    }

    #[test]
    fn weight_is_clamped_to_maximum() {
        let model = WeightModel::default();
        assert_eq!(model.weight_for(100, 100, 100), model.max_weight);
    }

    #[test]
    fn neutral_outcome_leaves_stats_untouched() {
        let model = WeightModel::default();
        let mut stats = VoterStats::new(VoterId::new("v"), model.min_weight);
        model.apply(&mut stats, Outcome::Correct);
        let before = stats.clone();
        assert!(!model.apply(&mut stats, Outcome::Neutral));
        assert_eq!(stats, before);
    }

    #[test]
    fn accuracy_bonus_is_monotone_in_ratio() {
        let model = WeightModel::default();
        let mut last = 0;
        for correct in 0..=10 {
            let bonus = model.accuracy_bonus(correct, 10);
            assert!(bonus >= last);
            last = bonus;
        }
    }

    #[test]
    fn streak_bonus_is_capped() {
        let model = WeightModel::default();
        assert_eq!(model.streak_bonus(DEFAULT_STREAK_CAP), model.streak_bonus(1_000));
    }
}
