// crates/vote-ledger-core/src/core/decision.rs
// ============================================================================
// Module: Vote Ledger Decisions
// Description: Recorded votes and their one-shot evaluation state.
// Purpose: Model append-only decision records with a tagged evaluation transition.
// Dependencies: crate::core::{identifiers, price, time}, serde
// ============================================================================

//! ## Overview
//! A [`DecisionRecord`] captures one vote together with the asset price seen
//! when it was recorded. Evaluation is a tagged transition from
//! [`Evaluation::Pending`] to [`Evaluation::Evaluated`]; there is no way to
//! represent an evaluated decision without its final price and outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AssetId;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::ProposalId;
use crate::core::identifiers::VoterId;
use crate::core::price::Price;
use crate::core::price::PriceDirection;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Vote Inputs
// ============================================================================

/// Kind of proposal the vote was cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    /// Proposal to take or grow a position in the asset.
    Invest,
    /// Proposal to reduce a position in the asset.
    Divest,
    /// Proposal to exit the position entirely.
    Ragequit,
}

impl ProposalKind {
    /// Returns true when a "yes" vote bets on the price rising.
    #[must_use]
    pub const fn yes_expects_rise(self) -> bool {
        matches!(self, Self::Invest)
    }
}

/// Direction of the recorded vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    /// Vote in favor of the proposal.
    Yes,
    /// Vote against the proposal.
    No,
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Classification of an evaluated decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The price moved the way the vote predicted.
    Correct,
    /// The price moved against the vote.
    Incorrect,
    /// The price stayed within the change threshold.
    Neutral,
}

/// Flat outcome view including the not-yet-evaluated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Evaluated as correct.
    Correct,
    /// Evaluated as incorrect.
    Incorrect,
    /// Evaluated as neutral.
    Neutral,
    /// Not evaluated yet.
    Unevaluated,
}

impl From<Outcome> for DecisionOutcome {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Correct => Self::Correct,
            Outcome::Incorrect => Self::Incorrect,
            Outcome::Neutral => Self::Neutral,
        }
    }
}

/// Final evaluation data written exactly once per decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Price read at evaluation time.
    pub final_price: Price,
    /// Gateway observation time for the final price.
    pub final_price_as_of: Timestamp,
    /// Ledger time of the evaluation.
    pub evaluated_at: Timestamp,
    /// Classified price direction.
    pub direction: PriceDirection,
    /// Resulting outcome.
    pub outcome: Outcome,
}

/// Evaluation state of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Evaluation {
    /// Awaiting evaluation.
    Pending,
    /// Evaluated; immutable from here on.
    Evaluated(EvaluationRecord),
}

// ============================================================================
// SECTION: Decision Record
// ============================================================================

/// One recorded vote with its price-at-recording snapshot.
///
/// # Invariants
/// - All fields except `evaluation` are immutable after creation.
/// - `evaluation` transitions at most once, from `Pending` to `Evaluated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Decision identifier.
    pub decision_id: DecisionId,
    /// Recording sequence number (ties in `recorded_at` order by `seq`).
    pub seq: u64,
    /// Proposal the vote belongs to.
    pub proposal_id: ProposalId,
    /// Voter who cast the vote.
    pub voter: VoterId,
    /// Proposal kind.
    pub proposal_kind: ProposalKind,
    /// Asset whose price decides the outcome.
    pub asset: AssetId,
    /// Vote direction.
    pub vote: VoteDirection,
    /// Price captured when the decision was recorded.
    pub price_at_recording: Price,
    /// Gateway observation time of `price_at_recording`.
    pub price_as_of: Timestamp,
    /// Ledger time of recording.
    pub recorded_at: Timestamp,
    /// Evaluation state.
    pub evaluation: Evaluation,
}

impl DecisionRecord {
    /// Returns true once the decision has been evaluated.
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        matches!(self.evaluation, Evaluation::Evaluated(_))
    }

    /// Returns the flat outcome view.
    #[must_use]
    pub fn outcome(&self) -> DecisionOutcome {
        match &self.evaluation {
            Evaluation::Pending => DecisionOutcome::Unevaluated,
            Evaluation::Evaluated(record) => record.outcome.into(),
        }
    }
}
