// crates/vote-ledger-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for vote ledger configuration. The example is parsed
//! and validated by the test suite so it cannot drift from the model.

/// Returns a canonical example `vote-ledger.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[evaluation]
validity_delay_ms = 604800000
change_threshold_bps = 500
max_batch_size = 100

[weights]
min_weight_bps = 10000
max_weight_bps = 30000
accuracy_bonus_max_bps = 10000
streak_bonus_step_bps = 2500
streak_bonus_cap = 4

[epochs]
duration_ms = 2592000000
budget = 1000000
base_reward = 1000
genesis = "2026-01-01T00:00:00Z"

[price]
max_staleness_ms = 300000

[store]
type = "sqlite"
path = "vote-ledger.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[audit]
type = "file"
path = "vote-ledger-audit.jsonl"

[[authorization.grants]]
principal = "governance-bridge"
capabilities = ["record_decision"]

[[authorization.grants]]
principal = "keeper"
capabilities = ["evaluate", "advance_epoch", "distribute"]
"#,
    )
}
