// crates/vote-ledger-core/src/runtime/outcome.rs
// ============================================================================
// Module: Vote Ledger Outcome Classification
// Description: Price-direction and decision-outcome classification.
// Purpose: Decide whether a vote was proven correct by the observed price move.
// Dependencies: bigdecimal, crate::core
// ============================================================================

//! ## Overview
//! Classification is pure and exact: the signed change
//! `(final - initial) / initial` is compared to the threshold using decimal
//! arithmetic scaled to basis points, so there is no floating-point rounding
//! at the band edges. A move exactly equal to the threshold is `Flat`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bigdecimal::BigDecimal;

use crate::core::Outcome;
use crate::core::Price;
use crate::core::PriceDirection;
use crate::core::ProposalKind;
use crate::core::VoteDirection;

/// Basis points in one whole unit (100%).
const BPS_PER_UNIT: u64 = 10_000;

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies the price move between two prices against a threshold in bps.
#[must_use]
pub fn classify_direction(
    initial: &Price,
    final_price: &Price,
    threshold_bps: u32,
) -> PriceDirection {
    let change = (final_price.as_decimal() - initial.as_decimal()) * BigDecimal::from(BPS_PER_UNIT);
    let band = initial.as_decimal().clone() * BigDecimal::from(threshold_bps);
    if change > band {
        PriceDirection::Up
    } else if change < -band {
        PriceDirection::Down
    } else {
        PriceDirection::Flat
    }
}

/// Maps a vote and an observed price direction to an outcome.
///
/// Ragequit is judged like Divest: a "yes" vote bets on the price falling.
#[must_use]
pub const fn classify_outcome(
    kind: ProposalKind,
    vote: VoteDirection,
    direction: PriceDirection,
) -> Outcome {
    let expects_rise = match vote {
        VoteDirection::Yes => kind.yes_expects_rise(),
        VoteDirection::No => !kind.yes_expects_rise(),
    };
    match (direction, expects_rise) {
        (PriceDirection::Flat, _) => Outcome::Neutral,
        (PriceDirection::Up, true) | (PriceDirection::Down, false) => Outcome::Correct,
        (PriceDirection::Up, false) | (PriceDirection::Down, true) => Outcome::Incorrect,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
