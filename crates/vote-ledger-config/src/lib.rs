// crates/vote-ledger-config/src/lib.rs
// ============================================================================
// Module: Vote Ledger Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for vote-ledger.toml semantics.
// Dependencies: vote-ledger-core, vote-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `vote-ledger-config` defines the configuration file for the vote reward
//! ledger. It provides strict, fail-closed validation and converts a loaded
//! file into the engine config and collaborators the ledger is built from.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
