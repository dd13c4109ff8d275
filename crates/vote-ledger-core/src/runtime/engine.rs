// crates/vote-ledger-core/src/runtime/engine.rs
// ============================================================================
// Module: Vote Ledger Engine
// Description: Decision recording, evaluation, epoch advancement, and claims.
// Purpose: Execute every ledger operation atomically against an injected store.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`RewardLedger`] is the single execution path for ledger state changes.
//! Each public operation checks the caller's capability, then runs inside one
//! [`LedgerStore::transact`] call; any error rolls the whole operation back.
//! Audit events are collected during the transaction and emitted after it
//! commits.
//!
//! Time is always supplied by the caller. The engine never reads a clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AssetId;
use crate::core::DEFAULT_HASH_ALGORITHM;
use crate::core::DecisionId;
use crate::core::DecisionRecord;
use crate::core::Epoch;
use crate::core::EpochId;
use crate::core::Evaluation;
use crate::core::EvaluationRecord;
use crate::core::HashAlgorithm;
use crate::core::HashError;
use crate::core::Outcome;
use crate::core::PriceDirection;
use crate::core::PrincipalId;
use crate::core::ProposalId;
use crate::core::ProposalKind;
use crate::core::RewardCredit;
use crate::core::Timestamp;
use crate::core::TokenAmount;
use crate::core::VoteDirection;
use crate::core::VoterId;
use crate::core::VoterStats;
use crate::core::Weight;
use crate::core::derive_decision_id;
use crate::interfaces::Authorizer;
use crate::interfaces::Capability;
use crate::interfaces::CustodyError;
use crate::interfaces::LedgerStore;
use crate::interfaces::LedgerTables;
use crate::interfaces::PendingCursor;
use crate::interfaces::PriceError;
use crate::interfaces::PriceGateway;
use crate::interfaces::StoreError;
use crate::interfaces::TokenCustody;
use crate::runtime::allocator::AllocationError;
use crate::runtime::allocator::DEFAULT_EPOCH_DURATION_MS;
use crate::runtime::allocator::DistributionShare;
use crate::runtime::allocator::EpochSchedule;
use crate::runtime::allocator::PostedCredit;
use crate::runtime::allocator::distribute_remainder;
use crate::runtime::allocator::post_credit;
use crate::runtime::allocator::reverse_claim;
use crate::runtime::allocator::settle_claim;
use crate::runtime::allocator::weighted_reward;
use crate::runtime::audit::LedgerAuditEvent;
use crate::runtime::audit::LedgerAuditSink;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::outcome::classify_direction;
use crate::runtime::outcome::classify_outcome;
use crate::runtime::weights::WeightModel;

// ============================================================================
// SECTION: Ledger Configuration
// ============================================================================

/// Default delay between recording and evaluation (7 days).
pub const DEFAULT_VALIDITY_DELAY_MS: u64 = 7 * 24 * 60 * 60 * 1_000;
/// Default price change threshold (5%).
pub const DEFAULT_CHANGE_THRESHOLD_BPS: u32 = 500;
/// Default maximum batch size for batch evaluation and claims.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
/// Default per-epoch budget in base units.
pub const DEFAULT_EPOCH_BUDGET: u128 = 1_000_000;
/// Default base reward per correct evaluation at 1.0x weight.
pub const DEFAULT_BASE_REWARD: u128 = 1_000;

/// Configuration for the reward ledger engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Minimum time between recording and evaluation.
    pub validity_delay_ms: u64,
    /// Relative price change, in basis points, below which a move is flat.
    pub change_threshold_bps: u32,
    /// Upper bound on batch evaluation and batch claim sizes.
    pub max_batch_size: usize,
    /// Voter weight model.
    pub weights: WeightModel,
    /// Epoch schedule and budget.
    pub epochs: EpochSchedule,
    /// Credit for a correct evaluation at 1.0x weight.
    pub base_reward: TokenAmount,
    /// Hash algorithm used to derive decision identifiers.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            validity_delay_ms: DEFAULT_VALIDITY_DELAY_MS,
            change_threshold_bps: DEFAULT_CHANGE_THRESHOLD_BPS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            weights: WeightModel::default(),
            epochs: EpochSchedule {
                duration_ms: DEFAULT_EPOCH_DURATION_MS,
                budget: TokenAmount::new(DEFAULT_EPOCH_BUDGET),
                genesis_at: None,
            },
            base_reward: TokenAmount::new(DEFAULT_BASE_REWARD),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }
}

impl LedgerConfig {
    /// Validates configuration bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] when a bound is inconsistent.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.max_batch_size == 0 {
            return Err(LedgerError::InvalidConfig(
                "max_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.epochs.duration_ms == 0 {
            return Err(LedgerError::InvalidConfig(
                "epoch duration must be greater than zero".to_string(),
            ));
        }
        if i64::try_from(self.validity_delay_ms).is_err() {
            return Err(LedgerError::InvalidConfig("validity_delay_ms is too large".to_string()));
        }
        self.weights.validate().map_err(LedgerError::InvalidConfig)
    }
}

// ============================================================================
// SECTION: Reward Ledger Engine
// ============================================================================

/// Decision-correctness evaluation engine and epoch reward ledger.
pub struct RewardLedger<G, C, A, S> {
    /// Price gateway.
    prices: G,
    /// Token custody used for claim payouts.
    custody: C,
    /// Capability checker.
    authorizer: A,
    /// Transactional ledger store.
    store: S,
    /// Audit sink receiving committed events.
    audit: Arc<dyn LedgerAuditSink>,
    /// Engine configuration.
    config: LedgerConfig,
}

impl<G, C, A, S> RewardLedger<G, C, A, S>
where
    G: PriceGateway,
    C: TokenCustody,
    A: Authorizer,
    S: LedgerStore,
{
    /// Creates a ledger engine with a no-op audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfig`] when the configuration is invalid.
    pub fn new(
        prices: G,
        custody: C,
        authorizer: A,
        store: S,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            prices,
            custody,
            authorizer,
            store,
            audit: Arc::new(NoopAuditSink),
            config,
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn LedgerAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Decision ledger
    // ------------------------------------------------------------------------

    /// Records a vote together with the asset's current price.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`], [`LedgerError::AlreadyRecorded`],
    /// [`LedgerError::AssetUnsupported`], or a collaborator error.
    pub fn record_decision(&self, request: RecordDecisionRequest) -> Result<DecisionId, LedgerError> {
        self.authorize(&request.caller, Capability::RecordDecision, request.now)?;
        let decision_id = derive_decision_id(
            self.config.hash_algorithm,
            &request.proposal_id,
            &request.voter,
        )?;
        let record = self.store.transact(|tables| self.record_in(tables, &decision_id, request))?;
        self.emit(&LedgerAuditEvent::DecisionRecorded {
            at: record.recorded_at,
            decision_id: record.decision_id,
            proposal_id: record.proposal_id,
            voter: record.voter,
            asset: record.asset,
            price_at_recording: record.price_at_recording,
        });
        Ok(decision_id)
    }

    /// Records a decision inside an open transaction.
    fn record_in(
        &self,
        tables: &mut dyn LedgerTables,
        decision_id: &DecisionId,
        request: RecordDecisionRequest,
    ) -> Result<DecisionRecord, LedgerError> {
        if tables.decision(decision_id)?.is_some() {
            return Err(LedgerError::AlreadyRecorded(decision_id.to_string()));
        }
        let quote = self.prices.price(&request.asset, request.now)?;
        let record = DecisionRecord {
            decision_id: decision_id.clone(),
            seq: tables.next_decision_seq()?,
            proposal_id: request.proposal_id,
            voter: request.voter,
            proposal_kind: request.proposal_kind,
            asset: request.asset,
            vote: request.vote,
            price_at_recording: quote.value,
            price_as_of: quote.as_of,
            recorded_at: request.now,
            evaluation: Evaluation::Pending,
        };
        tables.insert_decision(&record)?;
        if tables.voter_stats(&record.voter)?.is_none() {
            tables.save_voter_stats(&VoterStats::new(
                record.voter.clone(),
                self.config.weights.min_weight,
            ))?;
        }
        Ok(record)
    }

    /// Loads a decision.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown identifiers.
    pub fn get_decision(&self, decision_id: &DecisionId) -> Result<DecisionRecord, LedgerError> {
        self.store.read(|tables| {
            tables.decision(decision_id)?.ok_or_else(|| not_found("decision", decision_id))
        })
    }

    // ------------------------------------------------------------------------
    // Evaluation engine
    // ------------------------------------------------------------------------

    /// Evaluates one decision whose validity delay has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`], [`LedgerError::AlreadyEvaluated`],
    /// [`LedgerError::TooEarly`], [`LedgerError::NoOpenEpoch`],
    /// [`LedgerError::EpochNotAdvanced`] when the open epoch's window has
    /// ended, or a collaborator error. No state changes on error.
    pub fn evaluate_decision(
        &self,
        caller: &PrincipalId,
        decision_id: &DecisionId,
        now: Timestamp,
    ) -> Result<EvaluationReport, LedgerError> {
        self.authorize(caller, Capability::Evaluate, now)?;
        let (report, events) =
            self.store.transact(|tables| self.evaluate_in(tables, decision_id, now))?;
        self.emit_all(&events);
        Ok(report)
    }

    /// Evaluates up to `max_count` eligible pending decisions in recording order.
    ///
    /// Each decision commits on its own. A decision whose price read fails is
    /// reported in [`BatchEvaluation::failures`], stays pending, and does not
    /// count against `max_count`; the scan moves past it until `max_count`
    /// decisions are evaluated or no eligible decision remains.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] when `max_count` exceeds the
    /// configured batch size, [`LedgerError::NoOpenEpoch`] before genesis,
    /// [`LedgerError::EpochNotAdvanced`] once the open epoch has ended, or a
    /// store error.
    pub fn evaluate_pending_decisions(
        &self,
        caller: &PrincipalId,
        max_count: usize,
        now: Timestamp,
    ) -> Result<BatchEvaluation, LedgerError> {
        self.authorize(caller, Capability::Evaluate, now)?;
        if max_count > self.config.max_batch_size {
            return Err(LedgerError::InvalidRequest(format!(
                "max_count {max_count} exceeds max_batch_size {}",
                self.config.max_batch_size
            )));
        }
        let cutoff = eligibility_cutoff(now, self.config.validity_delay_ms);
        self.store.read(|tables| -> Result<_, LedgerError> {
            if tables.latest_epoch()?.is_none() {
                return Err(LedgerError::NoOpenEpoch);
            }
            Ok(())
        })?;

        let mut batch = BatchEvaluation::default();
        let mut cursor: Option<PendingCursor> = None;
        while batch.reports.len() < max_count {
            let remaining = max_count - batch.reports.len();
            let page = self.store.read(|tables| -> Result<_, LedgerError> {
                Ok(tables.pending_decisions(cutoff, cursor, remaining)?)
            })?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(PendingCursor::from(last));
            for candidate in &page {
                let id = &candidate.decision_id;
                match self.store.transact(|tables| self.evaluate_in(tables, id, now)) {
                    Ok((report, events)) => {
                        self.emit_all(&events);
                        batch.reports.push(report);
                    }
                    Err(LedgerError::AlreadyEvaluated(_) | LedgerError::TooEarly { .. }) => {}
                    Err(
                        err @ (LedgerError::AssetUnsupported(_)
                        | LedgerError::PriceFeed(_)
                        | LedgerError::Overflow(_)),
                    ) => batch.failures.push(BatchFailure {
                        decision_id: id.clone(),
                        reason: err.to_string(),
                    }),
                    Err(err) => return Err(err),
                }
            }
        }
        batch.processed = batch.reports.len();
        Ok(batch)
    }

    /// Evaluates a decision inside an open transaction.
    fn evaluate_in(
        &self,
        tables: &mut dyn LedgerTables,
        decision_id: &DecisionId,
        now: Timestamp,
    ) -> Result<(EvaluationReport, Vec<LedgerAuditEvent>), LedgerError> {
        let mut record =
            tables.decision(decision_id)?.ok_or_else(|| not_found("decision", decision_id))?;
        if record.is_evaluated() {
            return Err(LedgerError::AlreadyEvaluated(decision_id.to_string()));
        }
        let ready_at = record
            .recorded_at
            .checked_add_millis(self.config.validity_delay_ms)
            .ok_or_else(|| LedgerError::Overflow("evaluation ready time".to_string()))?;
        if now < ready_at {
            return Err(LedgerError::TooEarly {
                decision_id: decision_id.to_string(),
                ready_at,
            });
        }
        let mut epoch =
            tables.latest_epoch()?.filter(|epoch| !epoch.finalized).ok_or(LedgerError::NoOpenEpoch)?;
        if epoch.is_due(now) {
            return Err(LedgerError::EpochNotAdvanced {
                epoch_id: epoch.epoch_id,
                end_time: epoch.end_time,
            });
        }

        let quote = self.prices.price(&record.asset, now)?;
        let direction = classify_direction(
            &record.price_at_recording,
            &quote.value,
            self.config.change_threshold_bps,
        );
        let outcome = classify_outcome(record.proposal_kind, record.vote, direction);
        record.evaluation = Evaluation::Evaluated(EvaluationRecord {
            final_price: quote.value,
            final_price_as_of: quote.as_of,
            evaluated_at: now,
            direction,
            outcome,
        });
        tables.update_decision(&record)?;

        let mut report = EvaluationReport {
            decision_id: decision_id.clone(),
            voter: record.voter.clone(),
            direction,
            outcome,
            weight: None,
            epoch_id: None,
            credit: None,
        };
        let mut events = Vec::new();
        if outcome != Outcome::Neutral {
            let mut stats = tables.voter_stats(&record.voter)?.unwrap_or_else(|| {
                VoterStats::new(record.voter.clone(), self.config.weights.min_weight)
            });
            self.config.weights.apply(&mut stats, outcome);
            tables.save_voter_stats(&stats)?;
            report.weight = Some(stats.current_weight);

            if outcome == Outcome::Correct {
                let requested = weighted_reward(self.config.base_reward, stats.current_weight)?;
                let mut credit = tables
                    .credit(&record.voter, epoch.epoch_id)?
                    .unwrap_or_else(|| RewardCredit::empty(record.voter.clone(), epoch.epoch_id));
                let posted = post_credit(&mut epoch, &mut credit, requested)?;
                credit.weight_points =
                    credit.weight_points.saturating_add(stats.current_weight.bps());
                tables.save_credit(&credit)?;
                tables.save_epoch(&epoch)?;
                report.epoch_id = Some(epoch.epoch_id);
                report.credit = Some(posted);
                events.push(LedgerAuditEvent::CreditPosted {
                    at: now,
                    voter: record.voter.clone(),
                    epoch_id: epoch.epoch_id,
                    requested: posted.requested,
                    posted: posted.posted,
                });
            }
        }
        events.insert(
            0,
            LedgerAuditEvent::DecisionEvaluated {
                at: now,
                decision_id: decision_id.clone(),
                voter: record.voter,
                direction,
                outcome,
                weight: report.weight,
            },
        );
        Ok((report, events))
    }

    // ------------------------------------------------------------------------
    // Voter weight model
    // ------------------------------------------------------------------------

    /// Loads a voter's statistics.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for voters with no recorded decision.
    pub fn get_voter_stats(&self, voter: &VoterId) -> Result<VoterStats, LedgerError> {
        self.store
            .read(|tables| tables.voter_stats(voter)?.ok_or_else(|| not_found("voter", voter)))
    }

    // ------------------------------------------------------------------------
    // Epoch allocator
    // ------------------------------------------------------------------------

    /// Opens the genesis epoch, or closes the current epoch and opens the
    /// next one when its window has ended.
    ///
    /// Closing splits the epoch's remaining budget by weight points and
    /// finalizes it in the same transaction. When the epoch was already
    /// closed by [`Self::distribute_rewards`], only the successor is opened.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] or a store error.
    pub fn advance_epoch_if_due(
        &self,
        caller: &PrincipalId,
        now: Timestamp,
    ) -> Result<EpochAdvance, LedgerError> {
        self.authorize(caller, Capability::AdvanceEpoch, now)?;
        let advance = self.store.transact(|tables| -> Result<_, LedgerError> {
            let schedule = &self.config.epochs;
            let Some(mut current) = tables.latest_epoch()? else {
                let genesis = schedule.genesis(now)?;
                tables.save_epoch(&genesis)?;
                return Ok(EpochAdvance::Opened(genesis));
            };
            if current.finalized {
                let next = schedule.successor(&current, now)?;
                tables.save_epoch(&next)?;
                return Ok(EpochAdvance::Opened(next));
            }
            if !current.is_due(now) {
                return Ok(EpochAdvance::NotDue(current));
            }
            let distribution = close_epoch_in(tables, &mut current, now)?;
            let next = schedule.successor(&current, now)?;
            tables.save_epoch(&next)?;
            Ok(EpochAdvance::Advanced {
                finalized: current,
                distribution,
                opened: next,
            })
        })?;
        match &advance {
            EpochAdvance::Opened(epoch) => self.emit(&epoch_opened(now, epoch)),
            EpochAdvance::Advanced {
                finalized,
                distribution,
                opened,
            } => {
                self.emit_close(now, finalized, distribution);
                self.emit(&epoch_opened(now, opened));
            }
            EpochAdvance::NotDue(_) => {}
        }
        Ok(advance)
    }

    /// Loads an epoch.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown epochs.
    pub fn get_epoch(&self, epoch_id: EpochId) -> Result<Epoch, LedgerError> {
        self.store
            .read(|tables| tables.epoch(epoch_id)?.ok_or_else(|| not_found("epoch", epoch_id)))
    }

    /// Returns the most recently opened epoch, if any.
    ///
    /// # Errors
    ///
    /// Returns a store error when the read fails.
    pub fn current_epoch(&self) -> Result<Option<Epoch>, LedgerError> {
        self.store.read(|tables| -> Result<_, LedgerError> { Ok(tables.latest_epoch()?) })
    }

    /// Returns the pending (unclaimed) credit for a voter in an epoch.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for unknown epochs.
    pub fn get_claimable(&self, voter: &VoterId, epoch_id: EpochId) -> Result<TokenAmount, LedgerError> {
        self.store.read(|tables| -> Result<_, LedgerError> {
            tables.epoch(epoch_id)?.ok_or_else(|| not_found("epoch", epoch_id))?;
            Ok(tables
                .credit(voter, epoch_id)?
                .map_or(TokenAmount::ZERO, |credit| credit.pending_amount))
        })
    }

    /// Pays out a voter's pending credit for one epoch.
    ///
    /// The claim commits before custody is asked to transfer; a failed
    /// transfer restores the credit.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`], [`LedgerError::NothingToClaim`], or
    /// [`LedgerError::InsufficientFunds`]; credits stay intact on error.
    pub fn claim_rewards(
        &self,
        voter: &VoterId,
        epoch_id: EpochId,
        now: Timestamp,
    ) -> Result<ClaimReceipt, LedgerError> {
        let receipt = self.store.transact(|tables| -> Result<_, LedgerError> {
            tables.epoch(epoch_id)?.ok_or_else(|| not_found("epoch", epoch_id))?;
            let mut credit = tables
                .credit(voter, epoch_id)?
                .ok_or_else(|| nothing_to_claim(voter, epoch_id))?;
            let amount = settle_claim(&mut credit).ok_or_else(|| nothing_to_claim(voter, epoch_id))?;
            tables.save_credit(&credit)?;
            Ok(ClaimReceipt {
                voter: voter.clone(),
                epoch_id,
                amount,
            })
        })?;
        self.pay_out(voter, receipt.amount, std::slice::from_ref(&receipt))?;
        self.emit(&LedgerAuditEvent::RewardsClaimed {
            at: now,
            voter: voter.clone(),
            epoch_ids: vec![epoch_id],
            amount: receipt.amount,
        });
        Ok(receipt)
    }

    /// Pays out a voter's pending credit across several epochs with a single
    /// transfer. Unknown and empty epochs are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] for oversized batches or a
    /// custody error; credits stay intact on error.
    pub fn batch_claim_rewards(
        &self,
        voter: &VoterId,
        epoch_ids: &[EpochId],
        now: Timestamp,
    ) -> Result<BatchClaim, LedgerError> {
        if epoch_ids.len() > self.config.max_batch_size {
            return Err(LedgerError::InvalidRequest(format!(
                "batch of {} epochs exceeds max_batch_size {}",
                epoch_ids.len(),
                self.config.max_batch_size
            )));
        }
        let batch = self.store.transact(|tables| -> Result<_, LedgerError> {
            let mut batch = BatchClaim {
                voter: voter.clone(),
                claimed: Vec::new(),
                skipped: Vec::new(),
                total: TokenAmount::ZERO,
            };
            for &epoch_id in epoch_ids {
                if tables.epoch(epoch_id)?.is_none() {
                    batch.skipped.push(SkippedClaim {
                        epoch_id,
                        reason: SkipReason::UnknownEpoch,
                    });
                    continue;
                }
                let settled = tables.credit(voter, epoch_id)?.and_then(|mut credit| {
                    settle_claim(&mut credit).map(|amount| (credit, amount))
                });
                let Some((credit, amount)) = settled else {
                    batch.skipped.push(SkippedClaim {
                        epoch_id,
                        reason: SkipReason::NothingToClaim,
                    });
                    continue;
                };
                tables.save_credit(&credit)?;
                batch.total = batch
                    .total
                    .checked_add(amount)
                    .ok_or_else(|| LedgerError::Overflow("batch claim total".to_string()))?;
                batch.claimed.push(ClaimReceipt {
                    voter: voter.clone(),
                    epoch_id,
                    amount,
                });
            }
            Ok(batch)
        })?;
        if !batch.total.is_zero() {
            self.pay_out(voter, batch.total, &batch.claimed)?;
        }
        if !batch.claimed.is_empty() {
            self.emit(&LedgerAuditEvent::RewardsClaimed {
                at: now,
                voter: voter.clone(),
                epoch_ids: batch.claimed.iter().map(|receipt| receipt.epoch_id).collect(),
                amount: batch.total,
            });
        }
        Ok(batch)
    }

    /// Closes an ended epoch by splitting its remaining budget across its
    /// credited voters in proportion to their weight points, then finalizing
    /// it. The successor is opened by the next [`Self::advance_epoch_if_due`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`], [`LedgerError::EpochNotFinalized`]
    /// while the window is still open, or [`LedgerError::AlreadyDistributed`]
    /// once the epoch has been closed.
    pub fn distribute_rewards(
        &self,
        caller: &PrincipalId,
        epoch_id: EpochId,
        now: Timestamp,
    ) -> Result<Distribution, LedgerError> {
        self.authorize(caller, Capability::Distribute, now)?;
        let (epoch, distribution) = self.store.transact(|tables| -> Result<_, LedgerError> {
            let mut epoch =
                tables.epoch(epoch_id)?.ok_or_else(|| not_found("epoch", epoch_id))?;
            if epoch.finalized {
                return Err(LedgerError::AlreadyDistributed(epoch_id));
            }
            if !epoch.is_due(now) {
                return Err(LedgerError::EpochNotFinalized(epoch_id));
            }
            let distribution = close_epoch_in(tables, &mut epoch, now)?;
            Ok((epoch, distribution))
        })?;
        self.emit_close(now, &epoch, &distribution);
        Ok(distribution)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Checks a capability, auditing denials.
    fn authorize(
        &self,
        caller: &PrincipalId,
        capability: Capability,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if self.authorizer.is_authorized(caller, capability) {
            return Ok(());
        }
        self.emit(&LedgerAuditEvent::AccessDenied {
            at: now,
            principal: caller.clone(),
            capability,
        });
        Err(LedgerError::Unauthorized {
            principal: caller.to_string(),
            capability,
        })
    }

    /// Transfers a committed claim, restoring the settled credits when
    /// custody refuses the transfer.
    fn pay_out(
        &self,
        voter: &VoterId,
        total: TokenAmount,
        settled: &[ClaimReceipt],
    ) -> Result<(), LedgerError> {
        let Err(err) = self.custody.transfer(voter, total) else {
            return Ok(());
        };
        self.store.transact(|tables| -> Result<(), LedgerError> {
            for receipt in settled {
                let mut credit = tables
                    .credit(voter, receipt.epoch_id)?
                    .ok_or_else(|| not_found("credit", receipt.epoch_id))?;
                reverse_claim(&mut credit, receipt.amount)?;
                tables.save_credit(&credit)?;
            }
            Ok(())
        })?;
        Err(err.into())
    }

    /// Emits the events for a closed epoch.
    fn emit_close(&self, now: Timestamp, epoch: &Epoch, distribution: &Distribution) {
        self.emit(&LedgerAuditEvent::RewardsDistributed {
            at: now,
            epoch_id: epoch.epoch_id,
            recipients: distribution.shares.len(),
            amount: distribution.total,
        });
        self.emit(&LedgerAuditEvent::EpochFinalized {
            at: now,
            epoch_id: epoch.epoch_id,
            distributed: epoch.distributed,
            budget: epoch.budget,
        });
    }

    /// Emits one audit event.
    fn emit(&self, event: &LedgerAuditEvent) {
        self.audit.record(event);
    }

    /// Emits audit events in order.
    fn emit_all(&self, events: &[LedgerAuditEvent]) {
        for event in events {
            self.emit(event);
        }
    }
}

// ============================================================================
// SECTION: Requests and Results
// ============================================================================

/// Request to record a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDecisionRequest {
    /// Principal submitting the decision.
    pub caller: PrincipalId,
    /// Proposal voted on.
    pub proposal_id: ProposalId,
    /// Voter who cast the vote.
    pub voter: VoterId,
    /// Proposal kind.
    pub proposal_kind: ProposalKind,
    /// Asset whose price decides the outcome.
    pub asset: AssetId,
    /// Vote direction.
    pub vote: VoteDirection,
    /// Ledger time of recording.
    pub now: Timestamp,
}

/// Result of evaluating one decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Decision evaluated.
    pub decision_id: DecisionId,
    /// Voter of the decision.
    pub voter: VoterId,
    /// Classified direction.
    pub direction: PriceDirection,
    /// Resulting outcome.
    pub outcome: Outcome,
    /// Voter weight after the update; absent for neutral outcomes.
    pub weight: Option<Weight>,
    /// Epoch credited, for correct outcomes.
    pub epoch_id: Option<EpochId>,
    /// Credit posted, for correct outcomes.
    pub credit: Option<PostedCredit>,
}

/// Batch evaluation failure for a single decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Decision left pending.
    pub decision_id: DecisionId,
    /// Failure description.
    pub reason: String,
}

/// Result of a batch evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEvaluation {
    /// Number of decisions evaluated.
    pub processed: usize,
    /// Reports in evaluation order.
    pub reports: Vec<EvaluationReport>,
    /// Decisions that could not be evaluated and remain pending.
    pub failures: Vec<BatchFailure>,
}

/// Result of an epoch advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EpochAdvance {
    /// A new epoch was opened: genesis, or the successor of an epoch
    /// already closed by distribution.
    Opened(Epoch),
    /// The current epoch was closed and its successor opened.
    Advanced {
        /// Epoch that was finalized.
        finalized: Epoch,
        /// Remainder split posted while closing.
        distribution: Distribution,
        /// Epoch that was opened.
        opened: Epoch,
    },
    /// The current epoch has not ended.
    NotDue(Epoch),
}

/// Receipt for a single-epoch claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Claiming voter.
    pub voter: VoterId,
    /// Epoch claimed.
    pub epoch_id: EpochId,
    /// Amount transferred.
    pub amount: TokenAmount,
}

/// Reason an epoch was skipped in a batch claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The epoch does not exist.
    UnknownEpoch,
    /// Nothing is pending for the voter in the epoch.
    NothingToClaim,
}

/// Epoch skipped in a batch claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedClaim {
    /// Skipped epoch.
    pub epoch_id: EpochId,
    /// Skip reason.
    pub reason: SkipReason,
}

/// Result of a batch claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchClaim {
    /// Claiming voter.
    pub voter: VoterId,
    /// Epochs paid out.
    pub claimed: Vec<ClaimReceipt>,
    /// Epochs skipped.
    pub skipped: Vec<SkippedClaim>,
    /// Amount transferred in the single payout.
    pub total: TokenAmount,
}

/// Result of a remainder distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Epoch distributed.
    pub epoch_id: EpochId,
    /// Per-voter shares.
    pub shares: Vec<DistributionShare>,
    /// Total amount posted.
    pub total: TokenAmount,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reward ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Unknown decision, voter, or epoch.
    #[error("not found: {0}")]
    NotFound(String),
    /// The voter already recorded a decision for the proposal.
    #[error("decision already recorded: {0}")]
    AlreadyRecorded(String),
    /// The decision was already evaluated.
    #[error("decision already evaluated: {0}")]
    AlreadyEvaluated(String),
    /// The epoch remainder was already distributed.
    #[error("epoch {0} already distributed")]
    AlreadyDistributed(EpochId),
    /// The validity delay has not elapsed.
    #[error("decision {decision_id} cannot be evaluated before {ready_at}")]
    TooEarly {
        /// Decision identifier.
        decision_id: String,
        /// Earliest evaluation time.
        ready_at: Timestamp,
    },
    /// The price gateway does not serve the asset.
    #[error("asset unsupported: {0}")]
    AssetUnsupported(String),
    /// The caller lacks the required capability.
    #[error("principal {principal} lacks capability {}", .capability.as_str())]
    Unauthorized {
        /// Denied principal.
        principal: String,
        /// Missing capability.
        capability: Capability,
    },
    /// No pending credit for the voter in the epoch.
    #[error("nothing to claim: {0}")]
    NothingToClaim(String),
    /// Token custody cannot cover the payout.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Requested amount.
        requested: TokenAmount,
        /// Available balance.
        available: TokenAmount,
    },
    /// No epoch is open to receive credit.
    #[error("no open epoch")]
    NoOpenEpoch,
    /// The epoch's window has not ended, so it cannot be finalized yet.
    #[error("epoch {0} has not ended and cannot be finalized")]
    EpochNotFinalized(EpochId),
    /// The open epoch's window has ended but it has not been advanced.
    #[error("epoch {epoch_id} ended at {end_time} and must be advanced first")]
    EpochNotAdvanced {
        /// Epoch whose window ended.
        epoch_id: EpochId,
        /// End of the epoch window.
        end_time: Timestamp,
    },
    /// Request parameters are out of bounds.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Engine configuration is invalid.
    #[error("invalid ledger config: {0}")]
    InvalidConfig(String),
    /// Price gateway error other than an unsupported asset.
    #[error(transparent)]
    PriceFeed(PriceError),
    /// Token custody error other than insufficient funds.
    #[error("custody error: {0}")]
    Custody(String),
    /// Ledger store error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Hashing error.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Amount or timestamp arithmetic overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),
}

impl LedgerError {
    /// Returns true when retrying later may succeed without other changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TooEarly { .. })
    }

    /// Returns true for no-op conditions that callers may surface as benign.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NothingToClaim(_))
    }
}

impl From<PriceError> for LedgerError {
    fn from(err: PriceError) -> Self {
        match err {
            PriceError::AssetUnsupported(asset) => Self::AssetUnsupported(asset),
            other => Self::PriceFeed(other),
        }
    }
}

impl From<CustodyError> for LedgerError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::InsufficientFunds {
                requested,
                available,
            } => Self::InsufficientFunds {
                requested,
                available,
            },
            CustodyError::Transfer(message) => Self::Custody(message),
        }
    }
}

impl From<AllocationError> for LedgerError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::EpochFinalized(_) => Self::NoOpenEpoch,
            AllocationError::InvalidSchedule(message) => Self::InvalidConfig(message),
            AllocationError::Overflow(message) => Self::Overflow(message),
        }
    }
}

// ============================================================================
// SECTION: Helper Functions
// ============================================================================

/// Splits an ended epoch's remainder and finalizes it inside an open
/// transaction.
fn close_epoch_in(
    tables: &mut dyn LedgerTables,
    epoch: &mut Epoch,
    now: Timestamp,
) -> Result<Distribution, LedgerError> {
    let mut credits = tables.epoch_credits(epoch.epoch_id)?;
    let shares = distribute_remainder(epoch, &mut credits)?;
    for credit in credits.iter().filter(|credit| credit.weight_points > 0) {
        tables.save_credit(credit)?;
    }
    epoch.remainder_distributed_at = Some(now);
    tables.save_epoch(epoch)?;
    let mut total = TokenAmount::ZERO;
    for share in &shares {
        total = total
            .checked_add(share.amount)
            .ok_or_else(|| LedgerError::Overflow("distribution total".to_string()))?;
    }
    Ok(Distribution {
        epoch_id: epoch.epoch_id,
        shares,
        total,
    })
}

/// Builds a not-found error for a labeled identifier.
fn not_found(kind: &str, id: impl std::fmt::Display) -> LedgerError {
    LedgerError::NotFound(format!("{kind} {id}"))
}

/// Builds a nothing-to-claim error.
fn nothing_to_claim(voter: &VoterId, epoch_id: EpochId) -> LedgerError {
    LedgerError::NothingToClaim(format!("voter {voter} in epoch {epoch_id}"))
}

/// Builds the epoch-opened audit event.
fn epoch_opened(now: Timestamp, epoch: &Epoch) -> LedgerAuditEvent {
    LedgerAuditEvent::EpochOpened {
        at: now,
        epoch_id: epoch.epoch_id,
        start_time: epoch.start_time,
        end_time: epoch.end_time,
        budget: epoch.budget,
    }
}

/// Returns the latest recording time eligible for evaluation at `now`.
fn eligibility_cutoff(now: Timestamp, validity_delay_ms: u64) -> Timestamp {
    let delay = i64::try_from(validity_delay_ms).unwrap_or(i64::MAX);
    Timestamp::from_unix_millis(now.as_unix_millis().saturating_sub(delay))
}
