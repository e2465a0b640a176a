// crates/assertion-server-core/src/core/request.rs
// ============================================================================
// Module: Assertion Server Requests
// Description: Assertion query request payload.
// Purpose: Describe what a relying party asks the authority to vouch for.
// Dependencies: crate::core::{attribute, identity}, serde
// ============================================================================

//! ## Overview
//! An [`AssertionRequest`] asks: does this subject hold this attribute,
//! according to this issuer? The queried attribute carries zero values to
//! match any value, or exactly one to match that value alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::attribute::Attribute;
use crate::core::identity::NameId;

// ============================================================================
// SECTION: Assertion Request
// ============================================================================

/// Request for attribute assertions about a subject.
///
/// # Invariants
/// - `attribute` carries at most one value; the authority rejects more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionRequest {
    /// Subject the assertion should speak about.
    pub subject: NameId,
    /// Issuer whose authority is requested (the source of authority).
    pub issuer: NameId,
    /// Queried attribute; zero values match any value.
    pub attribute: Attribute,
}

impl AssertionRequest {
    /// Creates an assertion request.
    #[must_use]
    pub const fn new(subject: NameId, issuer: NameId, attribute: Attribute) -> Self {
        Self {
            subject,
            issuer,
            attribute,
        }
    }
}
