// crates/assertion-server-core/src/core/conditions.rs
// ============================================================================
// Module: Assertion Server Conditions
// Description: Validity window and extra-condition variants for assertions.
// Purpose: Bound the period during which an assertion may be relied upon.
// Dependencies: crate::core::time, serde, thiserror
// ============================================================================

//! ## Overview
//! Conditions attach a validity window and extra constraints to an assertion.
//! Both window bounds are optional; an absent bound imposes no constraint on
//! that side. Extra conditions form a closed enum so that verifiers match
//! every variant exhaustively; new condition kinds extend the enum.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Condition Variants
// ============================================================================

/// Extra condition attached to an assertion's validity.
///
/// # Invariants
/// - The variant set is closed; verifiers match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// The assertion must not be cached for reuse.
    OneTimeUse,
}

// ============================================================================
// SECTION: Window Errors
// ============================================================================

/// Validity window violations.
///
/// # Invariants
/// - Variants are stable for programmatic handling by relying parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowError {
    /// The evaluation instant precedes the window.
    #[error("assertion not yet valid")]
    NotYetValid,
    /// The evaluation instant is on or after the window end.
    #[error("assertion has expired")]
    Expired,
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// Validity constraints attached to an assertion.
///
/// # Invariants
/// - `not_before`, when present, is inclusive: evaluation at exactly
///   `not_before` passes.
/// - `not_on_or_after`, when present, is exclusive: evaluation at exactly
///   `not_on_or_after` fails as expired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Instant before which the assertion is not valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<Timestamp>,
    /// Instant at or after which the assertion is no longer valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<Timestamp>,
    /// Extra conditions, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Condition>,
}

impl Conditions {
    /// Creates conditions with only a validity window.
    #[must_use]
    pub const fn window(not_before: Option<Timestamp>, not_on_or_after: Option<Timestamp>) -> Self {
        Self {
            not_before,
            not_on_or_after,
            extra: Vec::new(),
        }
    }

    /// Evaluates the validity window against the given instant.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::NotYetValid`] when `at` precedes `not_before`
    /// and [`WindowError::Expired`] when `at` is on or after
    /// `not_on_or_after`.
    pub fn evaluate_at(&self, at: Timestamp) -> Result<(), WindowError> {
        if let Some(not_before) = self.not_before
            && at < not_before
        {
            return Err(WindowError::NotYetValid);
        }
        if let Some(not_on_or_after) = self.not_on_or_after
            && at >= not_on_or_after
        {
            return Err(WindowError::Expired);
        }
        Ok(())
    }
}
