//! File loading and builder tests for vote-ledger-config.
// crates/vote-ledger-config/tests/loading.rs
// =============================================================================
// Module: Config Loading Tests
// Description: Validate file loading limits and collaborator builders.
// Purpose: Ensure a config file wires a working ledger.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test-only diagnostics may print debug output.")]

use std::fs;
use std::str::FromStr;

use vote_ledger_config::ConfiguredStore;
use vote_ledger_config::VoteLedgerConfig;
use vote_ledger_core::AssetId;
use vote_ledger_core::Authorizer;
use vote_ledger_core::Capability;
use vote_ledger_core::EpochAdvance;
use vote_ledger_core::InMemoryPriceFeed;
use vote_ledger_core::InMemoryTreasury;
use vote_ledger_core::Price;
use vote_ledger_core::PriceError;
use vote_ledger_core::PriceGateway;
use vote_ledger_core::PrincipalId;
use vote_ledger_core::RewardLedger;
use vote_ledger_core::Timestamp;
use vote_ledger_core::TokenAmount;

mod common;

use common::TestResult;
use common::assert_invalid;

/// Verifies a config file on disk is loaded and validated.
#[test]
fn load_reads_file_from_explicit_path() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("vote-ledger.toml");
    fs::write(&path, "[evaluation]\nmax_batch_size = 7\n").map_err(|err| err.to_string())?;
    let config = VoteLedgerConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.evaluation.max_batch_size != 7 {
        return Err("file contents not applied".to_string());
    }
    Ok(())
}

/// Verifies missing, oversized, and non-utf8 files are rejected.
#[test]
fn load_rejects_bad_files() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    assert_invalid(VoteLedgerConfig::load(Some(&dir.path().join("missing.toml"))), "io error")?;

    let large = dir.path().join("large.toml");
    fs::write(&large, vec![b'#'; 1024 * 1024 + 1]).map_err(|err| err.to_string())?;
    assert_invalid(VoteLedgerConfig::load(Some(&large)), "size limit")?;

    let binary = dir.path().join("binary.toml");
    fs::write(&binary, [0xff, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(VoteLedgerConfig::load(Some(&binary)), "utf-8")
}

/// Verifies configured grants produce a deny-by-default authorizer.
#[test]
fn authorizer_reflects_grants() -> TestResult {
    let config = VoteLedgerConfig::from_toml_str(
        "[[authorization.grants]]\nprincipal = \"keeper\"\ncapabilities = [\"evaluate\"]\n",
    )
    .map_err(|err| err.to_string())?;
    let authorizer = config.authorizer();
    let keeper = PrincipalId::new("keeper");
    if !authorizer.is_authorized(&keeper, Capability::Evaluate) {
        return Err("keeper should evaluate".to_string());
    }
    if authorizer.is_authorized(&keeper, Capability::Distribute)
        || authorizer.is_authorized(&PrincipalId::new("other"), Capability::Evaluate)
    {
        return Err("authorizer must deny ungranted capabilities".to_string());
    }
    Ok(())
}

/// Verifies the staleness guard only applies when configured.
#[test]
fn price_guard_follows_staleness_setting() -> TestResult {
    let feed = InMemoryPriceFeed::new();
    let eth = AssetId::new("ETH");
    let price = Price::from_str("100").map_err(|err| err.to_string())?;
    feed.set_price(eth.clone(), price, Timestamp::from_unix_millis(0));
    let later = Timestamp::from_unix_millis(10_000);

    let unlimited = VoteLedgerConfig::from_toml_str("").map_err(|err| err.to_string())?;
    unlimited.guard_prices(feed.clone()).price(&eth, later).map_err(|err| err.to_string())?;

    let strict = VoteLedgerConfig::from_toml_str("[price]\nmax_staleness_ms = 5000\n")
        .map_err(|err| err.to_string())?;
    match strict.guard_prices(feed).price(&eth, later) {
        Err(PriceError::Stale { .. }) => Ok(()),
        other => Err(format!("expected stale quote, got {other:?}")),
    }
}

/// Verifies a sqlite-backed config wires a ledger that persists and audits.
#[test]
fn configured_collaborators_drive_a_ledger() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let db = dir.path().join("ledger.db");
    let audit = dir.path().join("audit.jsonl");
    let text = format!(
        "[epochs]\ngenesis = \"1970-01-01T00:00:00Z\"\n\n[store]\ntype = \"sqlite\"\npath = \
         {db:?}\n\n[audit]\ntype = \"file\"\npath = {audit:?}\n\n[[authorization.grants]]\n\
         principal = \"keeper\"\ncapabilities = [\"advance_epoch\"]\n",
        db = db.display().to_string(),
        audit = audit.display().to_string(),
    );
    let config = VoteLedgerConfig::from_toml_str(&text).map_err(|err| err.to_string())?;
    let store = config.open_store().map_err(|err| err.to_string())?;
    if !matches!(store, ConfiguredStore::Sqlite(_)) {
        return Err("expected sqlite store".to_string());
    }
    let ledger = RewardLedger::new(
        config.guard_prices(InMemoryPriceFeed::new()),
        InMemoryTreasury::funded(TokenAmount::new(1_000)),
        config.authorizer(),
        store,
        config.ledger_config().map_err(|err| err.to_string())?,
    )
    .map_err(|err| err.to_string())?
    .with_audit_sink(config.audit_sink().map_err(|err| err.to_string())?);

    let advance = ledger
        .advance_epoch_if_due(&PrincipalId::new("keeper"), Timestamp::from_unix_millis(5))
        .map_err(|err| err.to_string())?;
    if !matches!(advance, EpochAdvance::Opened(ref epoch) if epoch.start_time == Timestamp::from_unix_millis(0))
    {
        return Err(format!("unexpected advance: {advance:?}"));
    }

    let lines = fs::read_to_string(&audit).map_err(|err| err.to_string())?;
    let first = lines.lines().next().ok_or("missing audit line")?;
    if !first.contains("\"event\":\"epoch_opened\"") {
        return Err(format!("unexpected audit line: {first}"));
    }

    let reopened = config.open_store().map_err(|err| err.to_string())?;
    let reloaded = RewardLedger::new(
        InMemoryPriceFeed::new(),
        InMemoryTreasury::funded(TokenAmount::ZERO),
        config.authorizer(),
        reopened,
        config.ledger_config().map_err(|err| err.to_string())?,
    )
    .map_err(|err| err.to_string())?;
    if reloaded.current_epoch().map_err(|err| err.to_string())?.is_none() {
        return Err("epoch not persisted".to_string());
    }
    Ok(())
}
