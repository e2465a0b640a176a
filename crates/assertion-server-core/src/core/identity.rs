// crates/assertion-server-core/src/core/identity.rs
// ============================================================================
// Module: Assertion Server Identities
// Description: Opaque named principal identifiers for actors and subjects.
// Purpose: Provide the name-identifier model shared by issuers, subjects,
//          and sources of authority.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`NameId`] names a principal: an actor connecting to the authority, a
//! subject that attributes describe, an assertion issuer, or a source of
//! authority. Two identifiers are equal only when the name and every optional
//! component match; stores key attribute rows on the name component alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Qualifiers
// ============================================================================

/// Kind of qualifier attached to a name identifier.
///
/// # Invariants
/// - Variants are stable for serialization and equality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifierKind {
    /// Qualifier scopes the name itself.
    Name,
    /// Qualifier scopes the name to a service provider.
    ServiceProvider,
}

/// Qualifier scoping a name identifier.
///
/// # Invariants
/// - `value` is opaque; no normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameQualifier {
    /// Kind of scope the qualifier applies.
    pub kind: QualifierKind,
    /// Qualifier value.
    pub value: String,
}

// ============================================================================
// SECTION: Name Identifier
// ============================================================================

/// Opaque named principal identifier.
///
/// # Invariants
/// - `name` is required and non-empty for identifiers accepted by the
///   authority; deserialized identifiers are validated at the authority
///   boundary, not by this type.
/// - Equality covers the name, qualifier, format, and service-provider id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameId {
    /// Principal name.
    pub name: String,
    /// Optional scoping qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<NameQualifier>,
    /// Optional format URI for the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Optional identifier the service provider assigned to the principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp_provided_id: Option<String>,
}

impl NameId {
    /// Creates a name identifier with no optional components.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: None,
            format: None,
            sp_provided_id: None,
        }
    }

    /// Returns the principal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

impl From<&str> for NameId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NameId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
