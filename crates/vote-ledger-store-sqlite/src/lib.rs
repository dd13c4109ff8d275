// crates/vote-ledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Ledger Store
// Description: Durable LedgerStore backend using SQLite WAL.
// Purpose: Provide crash-safe persistence for the vote reward ledger.
// Dependencies: vote-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`LedgerStore`](vote_ledger_core::LedgerStore)
//! implementation. Each ledger operation runs in one `SQLite` transaction, so
//! a failed operation leaves no partial writes. Rows are stored as canonical
//! JSON with a content hash that is verified on every load.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_ROW_BYTES;
pub use store::SqliteLedgerStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
