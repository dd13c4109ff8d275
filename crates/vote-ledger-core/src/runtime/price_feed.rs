// crates/vote-ledger-core/src/runtime/price_feed.rs
// ============================================================================
// Module: Vote Ledger Price Feeds
// Description: In-memory price feed and staleness-enforcing gateway adapter.
// Purpose: Provide deterministic prices for tests and a quote-age policy.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryPriceFeed`] serves prices set by the caller. [`StalenessGuard`]
//! wraps any [`PriceGateway`] and rejects quotes older than a maximum age,
//! measured against the ledger time passed to the read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::AssetId;
use crate::core::Price;
use crate::core::PriceQuote;
use crate::core::Timestamp;
use crate::interfaces::PriceError;
use crate::interfaces::PriceGateway;

// ============================================================================
// SECTION: In-Memory Feed
// ============================================================================

/// Caller-driven price feed.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPriceFeed {
    /// Latest quote per asset.
    quotes: Arc<Mutex<BTreeMap<AssetId, PriceQuote>>>,
}

impl InMemoryPriceFeed {
    /// Creates an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quote for an asset.
    pub fn set_price(&self, asset: AssetId, value: Price, as_of: Timestamp) {
        if let Ok(mut quotes) = self.quotes.lock() {
            quotes.insert(
                asset,
                PriceQuote {
                    value,
                    as_of,
                },
            );
        }
    }

    /// Removes an asset so subsequent reads fail.
    pub fn remove(&self, asset: &AssetId) {
        if let Ok(mut quotes) = self.quotes.lock() {
            quotes.remove(asset);
        }
    }
}

impl PriceGateway for InMemoryPriceFeed {
    fn price(&self, asset: &AssetId, _now: Timestamp) -> Result<PriceQuote, PriceError> {
        let quotes = self
            .quotes
            .lock()
            .map_err(|_| PriceError::Unavailable("price feed mutex poisoned".to_string()))?;
        quotes.get(asset).cloned().ok_or_else(|| PriceError::AssetUnsupported(asset.to_string()))
    }
}

// ============================================================================
// SECTION: Staleness Guard
// ============================================================================

/// Gateway adapter rejecting quotes older than `max_age_ms`.
#[derive(Debug, Clone)]
pub struct StalenessGuard<G> {
    /// Wrapped gateway.
    inner: G,
    /// Maximum accepted quote age in milliseconds.
    max_age_ms: u64,
}

impl<G> StalenessGuard<G> {
    /// Wraps `inner` with a maximum quote age.
    #[must_use]
    pub const fn new(inner: G, max_age_ms: u64) -> Self {
        Self {
            inner,
            max_age_ms,
        }
    }

    /// Returns the wrapped gateway.
    #[must_use]
    pub const fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: PriceGateway> PriceGateway for StalenessGuard<G> {
    fn price(&self, asset: &AssetId, now: Timestamp) -> Result<PriceQuote, PriceError> {
        let quote = self.inner.price(asset, now)?;
        let age_ms = now.millis_since(quote.as_of);
        if age_ms > self.max_age_ms {
            return Err(PriceError::Stale {
                asset: asset.to_string(),
                age_ms,
                max_age_ms: self.max_age_ms,
            });
        }
        Ok(quote)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn guard_rejects_old_quotes() {
        let feed = InMemoryPriceFeed::new();
        let asset = AssetId::new("ETH");
        feed.set_price(asset.clone(), Price::from_units(10).unwrap(), Timestamp::from_unix_millis(0));
        let guard = StalenessGuard::new(feed, 1_000);
        assert!(guard.price(&asset, Timestamp::from_unix_millis(1_000)).is_ok());
        let err = guard.price(&asset, Timestamp::from_unix_millis(1_001)).unwrap_err();
        assert!(matches!(err, PriceError::Stale { age_ms: 1_001, .. }));
    }

    #[test]
    fn unknown_asset_is_unsupported() {
        let feed = InMemoryPriceFeed::new();
        let err = feed.price(&AssetId::new("BTC"), Timestamp::default()).unwrap_err();
        assert_eq!(err, PriceError::AssetUnsupported("BTC".to_string()));
    }
}
