// crates/assertion-server-core/src/core/assertion.rs
// ============================================================================
// Module: Assertion Server Assertion Model
// Description: Signed assertion documents, statements, and signature blobs.
// Purpose: Represent the signed, time-bounded artifact the authority issues.
// Dependencies: crate::core::{attribute, conditions, identity, time}, base64,
//               rand, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`SignedAssertion`] is the artifact the authority vouches with: a
//! freshly identified, time-stamped document binding an issuer, an optional
//! subject, validity conditions, and attribute statements, carrying a
//! detached signature over the canonical encoding of everything except the
//! signature itself. Assertions are immutable after construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::attribute::Attribute;
use crate::core::conditions::Conditions;
use crate::core::identity::NameId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Assertion Identifier
// ============================================================================

/// Unique identifier of an issued assertion.
///
/// # Invariants
/// - Generated identifiers start with an underscore followed by a URL-safe
///   base64 encoding of 128 random bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionId(String);

impl AssertionId {
    /// Creates an assertion identifier from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random assertion identifier.
    #[must_use]
    pub fn generate() -> Self {
        let raw: [u8; 16] = rand::random();
        Self(format!("_{}", URL_SAFE_NO_PAD.encode(raw)))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Subject and Statements
// ============================================================================

/// Subject an assertion speaks about.
///
/// # Invariants
/// - Wraps the subject name identifier; confirmation methods are out of
///   scope for this authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject name identifier.
    pub name_id: NameId,
}

impl Subject {
    /// Creates a subject from a name identifier.
    #[must_use]
    pub const fn new(name_id: NameId) -> Self {
        Self {
            name_id,
        }
    }
}

/// Attribute statement listing asserted attributes.
///
/// # Invariants
/// - Attribute order is preserved as supplied at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// Asserted attributes.
    pub attributes: Vec<Attribute>,
}

/// Statement variants an assertion may carry.
///
/// # Invariants
/// - The variant set is closed; new statement kinds extend the enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Attribute statement.
    Attribute(AttributeStatement),
}

// ============================================================================
// SECTION: Signature Blob
// ============================================================================

/// Detached signature over an assertion's canonical signing input.
///
/// # Invariants
/// - `algorithm` names the signature scheme and is checked on verification.
/// - `value` is the base64 encoding of the raw signature bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlob {
    /// Signature scheme label.
    pub algorithm: String,
    /// Optional identifier of the signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Base64-encoded signature bytes.
    pub value: String,
}

// ============================================================================
// SECTION: Signed Assertion
// ============================================================================

/// Wire encoding errors for assertions.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum WireError {
    /// Assertion could not be encoded.
    #[error("assertion encode error: {0}")]
    Encode(String),
    /// Assertion bytes could not be decoded.
    #[error("assertion decode error: {0}")]
    Decode(String),
}

/// Signed, time-bounded assertion document.
///
/// # Invariants
/// - Constructed once at issuance and never mutated afterwards.
/// - `signature`, when present, covers the canonical encoding of every other
///   field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAssertion {
    /// Unique assertion identifier.
    pub id: AssertionId,
    /// Instant the assertion was issued.
    pub issue_instant: Timestamp,
    /// Issuer identity.
    pub issuer: NameId,
    /// Optional subject the assertion speaks about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    /// Optional validity conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
    /// Carried statements, in issuance order.
    pub statements: Vec<Statement>,
    /// Detached signature over the canonical signing input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlob>,
}

impl SignedAssertion {
    /// Encodes the assertion for transport.
    ///
    /// The canonical signing input is independent of this encoding; see
    /// [`crate::core::canonical`].
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Encode`] when serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, WireError> {
        serde_json::to_vec(self).map_err(|err| WireError::Encode(err.to_string()))
    }

    /// Decodes an assertion received from transport.
    ///
    /// Decoding performs no verification; callers pass the result to an
    /// assertion verifier before relying on it.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Decode`] when the bytes are not a valid
    /// assertion document.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        serde_json::from_slice(bytes).map_err(|err| WireError::Decode(err.to_string()))
    }
}
