// crates/vote-ledger-core/src/core/price.rs
// ============================================================================
// Module: Vote Ledger Price Model
// Description: Decimal price values and point-in-time price quotes.
// Purpose: Carry exact asset prices between the price gateway and the ledger.
// Dependencies: bigdecimal, serde
// ============================================================================

//! ## Overview
//! Prices are arbitrary-precision decimals so percent-change classification is
//! exact. A [`Price`] is always strictly positive and serializes as a decimal
//! string, never as a JSON float.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Price
// ============================================================================

/// Strictly positive decimal asset price.
///
/// # Invariants
/// - Always `> 0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(BigDecimal);

impl Price {
    /// Creates a price from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPrice`] when the value is zero or negative.
    pub fn new(value: BigDecimal) -> Result<Self, InvalidPrice> {
        if value <= BigDecimal::from(0_i64) {
            return Err(InvalidPrice(value.to_string()));
        }
        Ok(Self(value.normalized()))
    }

    /// Creates a price from a whole-unit integer.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPrice`] when the value is zero.
    pub fn from_units(units: u64) -> Result<Self, InvalidPrice> {
        Self::new(BigDecimal::from(units))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }
}

impl FromStr for Price {
    type Err = InvalidPrice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let decimal =
            BigDecimal::from_str(value.trim()).map_err(|_| InvalidPrice(value.to_string()))?;
        Self::new(decimal)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Rejected price value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid price: {0} (must be a positive decimal)")]
pub struct InvalidPrice(pub String);

// ============================================================================
// SECTION: Quotes
// ============================================================================

/// Point-in-time price reading returned by the price gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Observed price.
    pub value: Price,
    /// Time the gateway observed the price.
    pub as_of: Timestamp,
}

/// Direction of a price move relative to the change threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDirection {
    /// Price rose by more than the threshold.
    Up,
    /// Price fell by more than the threshold.
    Down,
    /// Price stayed within the threshold band.
    Flat,
}
