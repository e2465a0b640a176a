// crates/assertion-server-core/src/core/canonical.rs
// ============================================================================
// Module: Assertion Server Canonical Encoding
// Description: Deterministic signing input for assertion documents.
// Purpose: Produce the byte encoding signatures are computed over.
// Dependencies: crate::core::assertion, serde, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! The signing input of an assertion is the JCS (RFC 8785) encoding of its
//! content with the signature field excluded. Signer and verifier both derive
//! the input from this module, so a document verifies if and only if its
//! content is byte-identical to what was signed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::assertion::AssertionId;
use crate::core::assertion::SignedAssertion;
use crate::core::assertion::Statement;
use crate::core::assertion::Subject;
use crate::core::conditions::Conditions;
use crate::core::identity::NameId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Canonical encoding errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CanonicalError {
    /// The content could not be canonically encoded.
    #[error("canonical encoding error: {0}")]
    Encode(String),
}

// ============================================================================
// SECTION: Signing Input
// ============================================================================

/// Serialize-only view of assertion content, excluding the signature.
#[derive(Serialize)]
struct SigningInput<'a> {
    /// Assertion identifier.
    id: &'a AssertionId,
    /// Issue instant.
    issue_instant: Timestamp,
    /// Issuer identity.
    issuer: &'a NameId,
    /// Optional subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a Subject>,
    /// Optional conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    conditions: Option<&'a Conditions>,
    /// Statements in issuance order.
    statements: &'a [Statement],
}

/// Returns the canonical signing input for an assertion's content.
///
/// The signature field never participates, so the same bytes are produced
/// before signing and during verification.
///
/// # Errors
///
/// Returns [`CanonicalError::Encode`] when JCS encoding fails.
pub fn signing_input(assertion: &SignedAssertion) -> Result<Vec<u8>, CanonicalError> {
    let input = SigningInput {
        id: &assertion.id,
        issue_instant: assertion.issue_instant,
        issuer: &assertion.issuer,
        subject: assertion.subject.as_ref(),
        conditions: assertion.conditions.as_ref(),
        statements: &assertion.statements,
    };
    serde_jcs::to_vec(&input).map_err(|err| CanonicalError::Encode(err.to_string()))
}
