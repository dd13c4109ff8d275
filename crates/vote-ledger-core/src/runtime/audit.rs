// crates/vote-ledger-core/src/runtime/audit.rs
// ============================================================================
// Module: Vote Ledger Audit Logging
// Description: Structured audit events for ledger state changes.
// Purpose: Emit JSON-line audit records without hard logging dependencies.
// Dependencies: crate::core, crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! The ledger reports every committed state change to a [`LedgerAuditSink`].
//! Events are emitted only after the enclosing transaction commits, so the
//! audit trail never describes a rolled-back change. Denied access attempts
//! are reported even though they change nothing.
//!
//! Sinks are deliberately small so deployments can route records into their
//! own pipeline: stderr, an append-only file, or an in-memory buffer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::core::AssetId;
use crate::core::DecisionId;
use crate::core::EpochId;
use crate::core::Outcome;
use crate::core::Price;
use crate::core::PriceDirection;
use crate::core::PrincipalId;
use crate::core::ProposalId;
use crate::core::Timestamp;
use crate::core::TokenAmount;
use crate::core::VoterId;
use crate::core::Weight;
use crate::interfaces::Capability;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Ledger audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerAuditEvent {
    /// A decision was recorded.
    DecisionRecorded {
        /// Ledger time.
        at: Timestamp,
        /// Decision identifier.
        decision_id: DecisionId,
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Voter identifier.
        voter: VoterId,
        /// Asset the vote concerns.
        asset: AssetId,
        /// Snapshot price.
        price_at_recording: Price,
    },
    /// A decision was evaluated.
    DecisionEvaluated {
        /// Ledger time.
        at: Timestamp,
        /// Decision identifier.
        decision_id: DecisionId,
        /// Voter identifier.
        voter: VoterId,
        /// Classified direction.
        direction: PriceDirection,
        /// Resulting outcome.
        outcome: Outcome,
        /// Voter weight after the update; absent for neutral outcomes.
        weight: Option<Weight>,
    },
    /// Credit was posted into an epoch.
    CreditPosted {
        /// Ledger time.
        at: Timestamp,
        /// Credited voter.
        voter: VoterId,
        /// Epoch credited.
        epoch_id: EpochId,
        /// Amount requested before the budget cap.
        requested: TokenAmount,
        /// Amount actually posted.
        posted: TokenAmount,
    },
    /// An epoch was opened.
    EpochOpened {
        /// Ledger time.
        at: Timestamp,
        /// New epoch identifier.
        epoch_id: EpochId,
        /// Window start.
        start_time: Timestamp,
        /// Window end.
        end_time: Timestamp,
        /// Epoch budget.
        budget: TokenAmount,
    },
    /// An epoch was finalized.
    EpochFinalized {
        /// Ledger time.
        at: Timestamp,
        /// Finalized epoch identifier.
        epoch_id: EpochId,
        /// Amount credited during the epoch.
        distributed: TokenAmount,
        /// Epoch budget.
        budget: TokenAmount,
    },
    /// A voter claimed rewards.
    RewardsClaimed {
        /// Ledger time.
        at: Timestamp,
        /// Claiming voter.
        voter: VoterId,
        /// Epochs paid out.
        epoch_ids: Vec<EpochId>,
        /// Amount transferred.
        amount: TokenAmount,
    },
    /// A finalized epoch's remainder was distributed.
    RewardsDistributed {
        /// Ledger time.
        at: Timestamp,
        /// Epoch identifier.
        epoch_id: EpochId,
        /// Number of voters credited.
        recipients: usize,
        /// Total amount posted.
        amount: TokenAmount,
    },
    /// A caller lacked the capability for an operation.
    AccessDenied {
        /// Ledger time.
        at: Timestamp,
        /// Denied principal.
        principal: PrincipalId,
        /// Missing capability.
        capability: Capability,
    },
}

impl LedgerAuditEvent {
    /// Returns the stable event label.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DecisionRecorded {
                ..
            } => "decision_recorded",
            Self::DecisionEvaluated {
                ..
            } => "decision_evaluated",
            Self::CreditPosted {
                ..
            } => "credit_posted",
            Self::EpochOpened {
                ..
            } => "epoch_opened",
            Self::EpochFinalized {
                ..
            } => "epoch_finalized",
            Self::RewardsClaimed {
                ..
            } => "rewards_claimed",
            Self::RewardsDistributed {
                ..
            } => "rewards_distributed",
            Self::AccessDenied {
                ..
            } => "access_denied",
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for ledger events.
pub trait LedgerAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &LedgerAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl LedgerAuditSink for StderrAuditSink {
    fn record(&self, event: &LedgerAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LedgerAuditSink for FileAuditSink {
    fn record(&self, event: &LedgerAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl LedgerAuditSink for NoopAuditSink {
    fn record(&self, _event: &LedgerAuditEvent) {}
}

/// Audit sink that buffers events in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events in emission order.
    events: Mutex<Vec<LedgerAuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LedgerAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the labels of the recorded events.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(LedgerAuditEvent::name).collect()
    }
}

impl LedgerAuditSink for MemoryAuditSink {
    fn record(&self, event: &LedgerAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
