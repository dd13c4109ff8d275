// crates/vote-ledger-core/src/core/time.rs
// ============================================================================
// Module: Vote Ledger Time Model
// Description: Canonical timestamp representation for ledger records.
// Purpose: Provide deterministic, replayable time values across ledger operations.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! The ledger uses explicit time values supplied by callers so evaluation
//! and epoch boundaries replay deterministically. The core engine never reads
//! wall-clock time directly; hosts pass `now` into every operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in ledger records (unix epoch milliseconds).
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Monotonicity across calls is a caller responsibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp shifted forward by `millis`, or `None` on overflow.
    #[must_use]
    pub fn checked_add_millis(self, millis: u64) -> Option<Self> {
        let delta = i64::try_from(millis).ok()?;
        self.0.checked_add(delta).map(Self)
    }

    /// Returns the non-negative distance from `earlier` to `self` in milliseconds.
    #[must_use]
    pub fn millis_since(self, earlier: Self) -> u64 {
        u64::try_from(self.0.saturating_sub(earlier.0)).unwrap_or(0)
    }

    /// Parses an RFC 3339 date-time into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the input is not valid RFC 3339 or is
    /// outside the millisecond range.
    pub fn parse_rfc3339(value: &str) -> Result<Self, TimestampError> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimestampError::Parse(err.to_string()))?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).map(Self).map_err(|_| TimestampError::OutOfRange)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors raised when parsing timestamps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// Input is not a valid RFC 3339 date-time.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// Parsed value does not fit in unix milliseconds.
    #[error("timestamp out of range")]
    OutOfRange,
}
