// crates/vote-ledger-core/src/lib.rs
// ============================================================================
// Module: Vote Ledger Core Library
// Description: Public API surface for the vote reward ledger.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Vote Ledger rewards participants in a collective decision process when the
//! observed price of an asset later proves their vote right. It records
//! decisions with a price snapshot, evaluates them after a validity delay,
//! maintains accuracy and streak weighted voter statistics, and credits
//! rewards into fixed-length epochs whose budgets are never exceeded.
//!
//! The crate is backend-agnostic: prices, custody, authorization, and
//! persistence are injected through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Authorizer;
pub use interfaces::Capability;
pub use interfaces::CustodyError;
pub use interfaces::LedgerStore;
pub use interfaces::LedgerTables;
pub use interfaces::PendingCursor;
pub use interfaces::PriceError;
pub use interfaces::PriceGateway;
pub use interfaces::StoreError;
pub use interfaces::TokenCustody;
pub use runtime::*;
