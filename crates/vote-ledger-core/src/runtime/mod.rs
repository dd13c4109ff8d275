// crates/vote-ledger-core/src/runtime/mod.rs
// ============================================================================
// Module: Vote Ledger Runtime
// Description: Evaluation engine, epoch allocator, and in-memory collaborators.
// Purpose: Execute ledger operations against injected collaborators.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement outcome classification, the voter weight model,
//! epoch accounting, and the [`RewardLedger`] engine that ties them together.
//! In-memory collaborators back tests and local demos.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod allocator;
pub mod audit;
pub mod custody;
pub mod engine;
pub mod outcome;
pub mod price_feed;
pub mod store;
pub mod weights;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::StaticAuthorizer;
pub use allocator::AllocationError;
pub use allocator::DEFAULT_EPOCH_DURATION_MS;
pub use allocator::DistributionShare;
pub use allocator::EpochSchedule;
pub use allocator::PostedCredit;
pub use audit::FileAuditSink;
pub use audit::LedgerAuditEvent;
pub use audit::LedgerAuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use custody::InMemoryTreasury;
pub use engine::BatchClaim;
pub use engine::BatchEvaluation;
pub use engine::BatchFailure;
pub use engine::ClaimReceipt;
pub use engine::DEFAULT_BASE_REWARD;
pub use engine::DEFAULT_CHANGE_THRESHOLD_BPS;
pub use engine::DEFAULT_EPOCH_BUDGET;
pub use engine::DEFAULT_MAX_BATCH_SIZE;
pub use engine::DEFAULT_VALIDITY_DELAY_MS;
pub use engine::Distribution;
pub use engine::EpochAdvance;
pub use engine::EvaluationReport;
pub use engine::LedgerConfig;
pub use engine::LedgerError;
pub use engine::RecordDecisionRequest;
pub use engine::RewardLedger;
pub use engine::SkipReason;
pub use engine::SkippedClaim;
pub use outcome::classify_direction;
pub use outcome::classify_outcome;
pub use price_feed::InMemoryPriceFeed;
pub use price_feed::StalenessGuard;
pub use store::InMemoryLedgerStore;
pub use weights::WeightModel;
