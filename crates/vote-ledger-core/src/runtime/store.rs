// crates/vote-ledger-core/src/runtime/store.rs
// ============================================================================
// Module: Vote Ledger In-Memory Store
// Description: Simple in-memory ledger store for tests and examples.
// Purpose: Provide a deterministic transactional store without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`LedgerStore`] for
//! tests and local demos. Transactions write straight into the committed
//! tables behind a mutex and keep an undo log of every row they touch; a
//! failed operation replays the log in reverse, so the cost of a transaction
//! tracks its write set rather than the size of the ledger.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::DecisionId;
use crate::core::DecisionRecord;
use crate::core::Epoch;
use crate::core::EpochId;
use crate::core::RewardCredit;
use crate::core::Timestamp;
use crate::core::VoterId;
use crate::core::VoterStats;
use crate::interfaces::LedgerStore;
use crate::interfaces::LedgerTables;
use crate::interfaces::PendingCursor;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Pending index key ordered by recording time, then sequence.
type PendingKey = (Timestamp, u64, DecisionId);

/// Committed table contents.
#[derive(Debug, Default)]
struct MemoryTables {
    /// Decisions by id.
    decisions: BTreeMap<DecisionId, DecisionRecord>,
    /// Pending-evaluation index.
    pending: BTreeSet<PendingKey>,
    /// Next decision sequence number.
    next_seq: u64,
    /// Voter statistics by voter.
    voters: BTreeMap<VoterId, VoterStats>,
    /// Epochs by id.
    epochs: BTreeMap<EpochId, Epoch>,
    /// Credits keyed by epoch then voter.
    credits: BTreeMap<(EpochId, VoterId), RewardCredit>,
}

impl MemoryTables {
    /// Scans the pending index in `(recorded_at, seq)` order.
    fn scan_pending(
        &self,
        recorded_before: Timestamp,
        after: Option<PendingCursor>,
        limit: usize,
    ) -> Result<Vec<DecisionRecord>, StoreError> {
        let lower = after.map_or(Bound::Unbounded, |cursor| {
            Bound::Included((cursor.recorded_at, cursor.seq, DecisionId::new("")))
        });
        let mut out = Vec::new();
        for (recorded_at, seq, decision_id) in self.pending.range((lower, Bound::Unbounded)) {
            if out.len() >= limit || *recorded_at > recorded_before {
                break;
            }
            if after.is_some_and(|cursor| (*recorded_at, *seq) <= (cursor.recorded_at, cursor.seq))
            {
                continue;
            }
            let record = self.decisions.get(decision_id).ok_or_else(|| {
                StoreError::Corrupt(format!("pending index references unknown {decision_id}"))
            })?;
            out.push(record.clone());
        }
        Ok(out)
    }

    /// Returns the credits of one epoch ordered by voter.
    fn credits_for(&self, epoch_id: EpochId) -> Vec<RewardCredit> {
        self.credits
            .range((epoch_id, VoterId::new(""))..)
            .take_while(|((id, _), _)| *id == epoch_id)
            .map(|(_, credit)| credit.clone())
            .collect()
    }
}

// ============================================================================
// SECTION: Undo Log
// ============================================================================

/// Prior state of one row touched by a transaction.
#[derive(Debug)]
enum Undo {
    /// Decision row before the write.
    Decision(DecisionId, Option<DecisionRecord>),
    /// Pending index entry and whether it was present.
    Pending(PendingKey, bool),
    /// Sequence counter before the write.
    NextSeq(u64),
    /// Voter statistics before the write.
    Voter(VoterId, Option<VoterStats>),
    /// Epoch before the write.
    Epoch(EpochId, Option<Epoch>),
    /// Credit before the write.
    Credit((EpochId, VoterId), Option<RewardCredit>),
}

/// Committed tables plus the undo log of the running transaction.
struct JournaledTables<'a> {
    /// Tables written in place.
    tables: &'a mut MemoryTables,
    /// Prior row states in write order.
    undo: Vec<Undo>,
}

impl<'a> JournaledTables<'a> {
    /// Starts a transaction over `tables`.
    const fn new(tables: &'a mut MemoryTables) -> Self {
        Self {
            tables,
            undo: Vec::new(),
        }
    }

    /// Sets a pending index entry, journaling its previous presence.
    fn set_pending(&mut self, key: PendingKey, present: bool) {
        let was_present = self.tables.pending.contains(&key);
        if was_present == present {
            return;
        }
        if present {
            self.tables.pending.insert(key.clone());
        } else {
            self.tables.pending.remove(&key);
        }
        self.undo.push(Undo::Pending(key, was_present));
    }

    /// Replays the undo log in reverse.
    fn rollback(self) {
        let tables = self.tables;
        for entry in self.undo.into_iter().rev() {
            match entry {
                Undo::Decision(id, prior) => restore(&mut tables.decisions, id, prior),
                Undo::Pending(key, true) => {
                    tables.pending.insert(key);
                }
                Undo::Pending(key, false) => {
                    tables.pending.remove(&key);
                }
                Undo::NextSeq(seq) => tables.next_seq = seq,
                Undo::Voter(voter, prior) => restore(&mut tables.voters, voter, prior),
                Undo::Epoch(id, prior) => restore(&mut tables.epochs, id, prior),
                Undo::Credit(key, prior) => restore(&mut tables.credits, key, prior),
            }
        }
    }
}

/// Puts a journaled row back into its map.
fn restore<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, prior: Option<V>) {
    match prior {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

impl LedgerTables for JournaledTables<'_> {
    fn decision(&self, decision_id: &DecisionId) -> Result<Option<DecisionRecord>, StoreError> {
        Ok(self.tables.decisions.get(decision_id).cloned())
    }

    fn insert_decision(&mut self, record: &DecisionRecord) -> Result<(), StoreError> {
        if self.tables.decisions.contains_key(&record.decision_id) {
            return Err(StoreError::Conflict(format!(
                "decision already exists: {}",
                record.decision_id
            )));
        }
        if !record.is_evaluated() {
            self.set_pending((record.recorded_at, record.seq, record.decision_id.clone()), true);
        }
        self.undo.push(Undo::NextSeq(self.tables.next_seq));
        self.tables.next_seq = self.tables.next_seq.max(record.seq.saturating_add(1));
        self.undo.push(Undo::Decision(record.decision_id.clone(), None));
        self.tables.decisions.insert(record.decision_id.clone(), record.clone());
        Ok(())
    }

    fn update_decision(&mut self, record: &DecisionRecord) -> Result<(), StoreError> {
        let Some(existing) = self.tables.decisions.get_mut(&record.decision_id) else {
            return Err(StoreError::Invalid(format!(
                "decision not found for update: {}",
                record.decision_id
            )));
        };
        let prior = std::mem::replace(existing, record.clone());
        self.undo.push(Undo::Decision(record.decision_id.clone(), Some(prior)));
        let key = (record.recorded_at, record.seq, record.decision_id.clone());
        self.set_pending(key, !record.is_evaluated());
        Ok(())
    }

    fn next_decision_seq(&self) -> Result<u64, StoreError> {
        Ok(self.tables.next_seq.max(1))
    }

    fn pending_decisions(
        &self,
        recorded_before: Timestamp,
        after: Option<PendingCursor>,
        limit: usize,
    ) -> Result<Vec<DecisionRecord>, StoreError> {
        self.tables.scan_pending(recorded_before, after, limit)
    }

    fn voter_stats(&self, voter: &VoterId) -> Result<Option<VoterStats>, StoreError> {
        Ok(self.tables.voters.get(voter).cloned())
    }

    fn save_voter_stats(&mut self, stats: &VoterStats) -> Result<(), StoreError> {
        let prior = self.tables.voters.insert(stats.voter.clone(), stats.clone());
        self.undo.push(Undo::Voter(stats.voter.clone(), prior));
        Ok(())
    }

    fn epoch(&self, epoch_id: EpochId) -> Result<Option<Epoch>, StoreError> {
        Ok(self.tables.epochs.get(&epoch_id).cloned())
    }

    fn latest_epoch(&self) -> Result<Option<Epoch>, StoreError> {
        Ok(self.tables.epochs.values().next_back().cloned())
    }

    fn save_epoch(&mut self, epoch: &Epoch) -> Result<(), StoreError> {
        let prior = self.tables.epochs.insert(epoch.epoch_id, epoch.clone());
        self.undo.push(Undo::Epoch(epoch.epoch_id, prior));
        Ok(())
    }

    fn credit(
        &self,
        voter: &VoterId,
        epoch_id: EpochId,
    ) -> Result<Option<RewardCredit>, StoreError> {
        Ok(self.tables.credits.get(&(epoch_id, voter.clone())).cloned())
    }

    fn save_credit(&mut self, credit: &RewardCredit) -> Result<(), StoreError> {
        let key = (credit.epoch_id, credit.voter.clone());
        let prior = self.tables.credits.insert(key.clone(), credit.clone());
        self.undo.push(Undo::Credit(key, prior));
        Ok(())
    }

    fn epoch_credits(&self, epoch_id: EpochId) -> Result<Vec<RewardCredit>, StoreError> {
        Ok(self.tables.credits_for(epoch_id))
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory ledger store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    /// Committed tables protected by a mutex.
    tables: Arc<Mutex<MemoryTables>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LedgerTables) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| StoreError::Store("ledger store mutex poisoned".to_string()))?;
        let mut journal = JournaledTables::new(&mut *guard);
        match op(&mut journal) {
            Ok(value) => Ok(value),
            Err(err) => {
                journal.rollback();
                Err(err)
            }
        }
    }

    fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&dyn LedgerTables) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| StoreError::Store("ledger store mutex poisoned".to_string()))?;
        op(&JournaledTables::new(&mut *guard))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
