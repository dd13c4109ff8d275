// crates/vote-ledger-core/tests/common/mod.rs
// =============================================================================
// Module: Ledger Test Helpers
// Description: Shared harness for reward ledger integration tests.
// Purpose: Reduce duplication across integration tests for vote-ledger-core.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::str::FromStr;
use std::sync::Arc;

use vote_ledger_core::AssetId;
use vote_ledger_core::Capability;
use vote_ledger_core::DecisionId;
use vote_ledger_core::Epoch;
use vote_ledger_core::EpochAdvance;
use vote_ledger_core::EpochSchedule;
use vote_ledger_core::EvaluationReport;
use vote_ledger_core::InMemoryLedgerStore;
use vote_ledger_core::InMemoryPriceFeed;
use vote_ledger_core::InMemoryTreasury;
use vote_ledger_core::LedgerConfig;
use vote_ledger_core::LedgerError;
use vote_ledger_core::MemoryAuditSink;
use vote_ledger_core::Price;
use vote_ledger_core::PrincipalId;
use vote_ledger_core::ProposalId;
use vote_ledger_core::ProposalKind;
use vote_ledger_core::RecordDecisionRequest;
use vote_ledger_core::RewardLedger;
use vote_ledger_core::StaticAuthorizer;
use vote_ledger_core::Timestamp;
use vote_ledger_core::TokenAmount;
use vote_ledger_core::VoteDirection;
use vote_ledger_core::VoterId;

/// Ledger wired with in-memory collaborators.
pub type TestLedger =
    RewardLedger<InMemoryPriceFeed, InMemoryTreasury, StaticAuthorizer, InMemoryLedgerStore>;

/// Validity delay used by the default test config.
pub const DELAY_MS: i64 = 1_000;
/// Epoch length used by the default test config.
pub const EPOCH_MS: u64 = 1_000_000;
/// Treasury balance used by the default harness.
pub const TREASURY: u128 = 1_000_000_000;

/// Returns a timestamp from unix milliseconds.
pub fn ts(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

/// Parses a decimal price.
pub fn price(value: &str) -> Price {
    Price::from_str(value).expect("price")
}

/// Principal holding every capability.
pub fn operator() -> PrincipalId {
    PrincipalId::new("operator")
}

/// Principal holding no capability.
pub fn stranger() -> PrincipalId {
    PrincipalId::new("stranger")
}

/// Returns a short-delay config with genesis at time zero.
pub fn test_config() -> LedgerConfig {
    LedgerConfig {
        validity_delay_ms: u64::try_from(DELAY_MS).expect("delay"),
        epochs: EpochSchedule {
            duration_ms: EPOCH_MS,
            budget: TokenAmount::new(1_000_000),
            genesis_at: Some(ts(0)),
        },
        ..LedgerConfig::default()
    }
}

/// Ledger plus handles on its collaborators.
pub struct Harness {
    /// Engine under test.
    pub ledger: TestLedger,
    /// Shared price feed handle.
    pub feed: InMemoryPriceFeed,
    /// Shared treasury handle.
    pub treasury: InMemoryTreasury,
    /// Audit events recorded by the engine.
    pub audit: Arc<MemoryAuditSink>,
}

impl Harness {
    /// Builds a harness with the default test config.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Builds a harness with a custom config and a well-funded treasury.
    pub fn with_config(config: LedgerConfig) -> Self {
        Self::with_treasury(config, InMemoryTreasury::funded(TokenAmount::new(TREASURY)))
    }

    /// Builds a harness with a custom config and treasury.
    pub fn with_treasury(config: LedgerConfig, treasury: InMemoryTreasury) -> Self {
        let feed = InMemoryPriceFeed::new();
        let authorizer = StaticAuthorizer::new().grant(
            operator(),
            [
                Capability::RecordDecision,
                Capability::Evaluate,
                Capability::AdvanceEpoch,
                Capability::Distribute,
            ],
        );
        let audit = Arc::new(MemoryAuditSink::new());
        let ledger = RewardLedger::new(
            feed.clone(),
            treasury.clone(),
            authorizer,
            InMemoryLedgerStore::new(),
            config,
        )
        .expect("ledger")
        .with_audit_sink(audit.clone());
        Self {
            ledger,
            feed,
            treasury,
            audit,
        }
    }

    /// Opens the genesis epoch.
    pub fn open_genesis(&self) -> Epoch {
        match self.ledger.advance_epoch_if_due(&operator(), ts(0)).expect("advance") {
            EpochAdvance::Opened(epoch) => epoch,
            other => panic!("expected genesis, got {other:?}"),
        }
    }

    /// Sets the price of an asset.
    pub fn set_price(&self, asset: &str, value: &str, at: i64) {
        self.feed.set_price(AssetId::new(asset), price(value), ts(at));
    }

    /// Records a decision on `asset` at `at`.
    pub fn record(
        &self,
        proposal: &str,
        voter: &str,
        kind: ProposalKind,
        vote: VoteDirection,
        asset: &str,
        at: i64,
    ) -> Result<DecisionId, LedgerError> {
        self.ledger.record_decision(RecordDecisionRequest {
            caller: operator(),
            proposal_id: ProposalId::new(proposal),
            voter: VoterId::new(voter),
            proposal_kind: kind,
            asset: AssetId::new(asset),
            vote,
            now: ts(at),
        })
    }

    /// Evaluates a decision at `at`.
    pub fn evaluate(&self, decision_id: &DecisionId, at: i64) -> Result<EvaluationReport, LedgerError> {
        self.ledger.evaluate_decision(&operator(), decision_id, ts(at))
    }

    /// Records a decision on an asset named after the proposal, moves the
    /// price from `start` to `end`, and evaluates once eligible.
    #[allow(clippy::too_many_arguments, reason = "Scenario helper mirrors decision fields.")]
    pub fn resolve(
        &self,
        proposal: &str,
        voter: &str,
        kind: ProposalKind,
        vote: VoteDirection,
        start: &str,
        end: &str,
        at: i64,
    ) -> EvaluationReport {
        self.set_price(proposal, start, at);
        let id = self.record(proposal, voter, kind, vote, proposal, at).expect("record");
        self.set_price(proposal, end, at + DELAY_MS);
        self.evaluate(&id, at + DELAY_MS).expect("evaluate")
    }

    /// Resolves an Invest/Yes decision as correct (price 100 to 120).
    pub fn win(&self, proposal: &str, voter: &str, at: i64) -> EvaluationReport {
        self.resolve(proposal, voter, ProposalKind::Invest, VoteDirection::Yes, "100", "120", at)
    }

    /// Resolves an Invest/Yes decision as incorrect (price 100 to 80).
    pub fn lose(&self, proposal: &str, voter: &str, at: i64) -> EvaluationReport {
        self.resolve(proposal, voter, ProposalKind::Invest, VoteDirection::Yes, "100", "80", at)
    }
}
