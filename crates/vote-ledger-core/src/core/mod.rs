// crates/vote-ledger-core/src/core/mod.rs
// ============================================================================
// Module: Vote Ledger Core Types
// Description: Canonical ledger records and value types.
// Purpose: Provide stable, serializable types for decisions, voters, and epochs.
// Dependencies: bigdecimal, serde, time
// ============================================================================

//! ## Overview
//! Core types define decisions, voter statistics, epochs, and reward credits.
//! These types are the canonical source of truth for every storage backend.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod decision;
pub mod epoch;
pub mod hashing;
pub mod identifiers;
pub mod price;
pub mod time;
pub mod voter;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use decision::DecisionOutcome;
pub use decision::DecisionRecord;
pub use decision::Evaluation;
pub use decision::EvaluationRecord;
pub use decision::Outcome;
pub use decision::ProposalKind;
pub use decision::VoteDirection;
pub use epoch::Epoch;
pub use epoch::RewardCredit;
pub use epoch::TokenAmount;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::derive_decision_id;
pub use hashing::hash_bytes;
pub use identifiers::AssetId;
pub use identifiers::DecisionId;
pub use identifiers::EpochId;
pub use identifiers::PrincipalId;
pub use identifiers::ProposalId;
pub use identifiers::VoterId;
pub use price::InvalidPrice;
pub use price::Price;
pub use price::PriceDirection;
pub use price::PriceQuote;
pub use time::Timestamp;
pub use time::TimestampError;
pub use voter::VoterStats;
pub use voter::WEIGHT_SCALE_BPS;
pub use voter::Weight;
