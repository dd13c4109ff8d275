// crates/vote-ledger-core/src/runtime/custody.rs
// ============================================================================
// Module: Vote Ledger In-Memory Treasury
// Description: Token custody backed by an in-memory balance.
// Purpose: Exercise claim payouts and custody failures deterministically.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryTreasury`] holds a single balance and records each payout. A
//! transfer larger than the balance fails with
//! [`CustodyError::InsufficientFunds`] and moves nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::TokenAmount;
use crate::core::VoterId;
use crate::interfaces::CustodyError;
use crate::interfaces::TokenCustody;

// ============================================================================
// SECTION: Treasury
// ============================================================================

/// Mutable treasury state.
#[derive(Debug, Default)]
struct TreasuryState {
    /// Remaining balance.
    balance: TokenAmount,
    /// Total paid out per voter.
    paid: BTreeMap<VoterId, TokenAmount>,
}

/// In-memory token custody.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTreasury {
    /// Shared state.
    state: Arc<Mutex<TreasuryState>>,
}

impl InMemoryTreasury {
    /// Creates a treasury funded with `balance`.
    #[must_use]
    pub fn funded(balance: TokenAmount) -> Self {
        Self {
            state: Arc::new(Mutex::new(TreasuryState {
                balance,
                paid: BTreeMap::new(),
            })),
        }
    }

    /// Returns the remaining balance.
    #[must_use]
    pub fn balance(&self) -> TokenAmount {
        self.state.lock().map(|state| state.balance).unwrap_or_default()
    }

    /// Returns the total paid to `voter`.
    #[must_use]
    pub fn paid_to(&self, voter: &VoterId) -> TokenAmount {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.paid.get(voter).copied())
            .unwrap_or_default()
    }
}

impl TokenCustody for InMemoryTreasury {
    fn transfer(&self, to: &VoterId, amount: TokenAmount) -> Result<(), CustodyError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| CustodyError::Transfer("treasury mutex poisoned".to_string()))?;
        if amount > state.balance {
            return Err(CustodyError::InsufficientFunds {
                requested: amount,
                available: state.balance,
            });
        }
        let paid = state.paid.get(to).copied().unwrap_or_default();
        let paid = paid
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Transfer("payout total overflows".to_string()))?;
        state.balance = state.balance.saturating_sub(amount);
        state.paid.insert(to.clone(), paid);
        drop(state);
        Ok(())
    }
}
