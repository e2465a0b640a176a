// crates/assertion-server-core/src/core/time.rs
// ============================================================================
// Module: Assertion Server Time Model
// Description: Canonical timestamp representation for assertions and windows.
// Purpose: Provide explicit instants for issue stamps and validity checks.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Assertions embed explicit instants: the issue instant and the optional
//! validity window bounds. Validity evaluation always takes the instant to
//! evaluate against as a parameter, so relying parties and tests control the
//! clock; [`Timestamp::now`] exists for the issuing side, which must stamp
//! real wall-clock time into new assertions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical instant used in assertion issue stamps and validity windows.
///
/// # Invariants
/// - Stored as unix epoch milliseconds; ordering is chronological.
/// - No timezone is carried; all values are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

    /// Returns the current wall-clock instant.
    #[must_use]
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let millis = i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX);
        Self(millis)
    }

    /// Returns this instant advanced by `duration`, saturating on overflow.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Returns this instant moved back by `duration`, saturating on overflow.
    #[must_use]
    pub fn saturating_sub(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = i128::from(self.0).saturating_mul(1_000_000);
        match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
            Ok(instant) => match instant.format(&Rfc3339) {
                Ok(text) => f.write_str(&text),
                Err(_) => self.0.fmt(f),
            },
            Err(_) => self.0.fmt(f),
        }
    }
}
