// crates/assertion-server-core/src/core/attribute.rs
// ============================================================================
// Module: Assertion Server Attribute Model
// Description: Attribute definitions, stored value records, and attribute
//              payloads.
// Purpose: Model the data the authority stores and asserts about subjects.
// Dependencies: crate::core::identity, serde
// ============================================================================

//! ## Overview
//! An [`AttributeDefinition`] declares an attribute under a source of
//! authority; an [`AttributeValueRecord`] is one stored assignment of that
//! attribute to a subject. An [`Attribute`] is the request/statement payload
//! carrying values in and out of the authority. A value record may exist only
//! while a matching definition exists, and its value must fall inside the
//! definition's allowed set when that set is non-empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identity::NameId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Data type used when an attribute payload does not declare one.
pub const STRING_DATA_TYPE: &str = "http://www.w3.org/2001/XMLSchema#string";

// ============================================================================
// SECTION: Identifier Newtypes
// ============================================================================

/// Attribute identifier under a source of authority.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(String);

impl AttributeId {
    /// Creates a new attribute identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AttributeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AttributeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Declared data type of an attribute.
///
/// # Invariants
/// - Opaque UTF-8 string, conventionally a type URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    /// Creates a new data type.
    #[must_use]
    pub fn new(data_type: impl Into<String>) -> Self {
        Self(data_type.into())
    }

    /// Returns the default string data type.
    #[must_use]
    pub fn string() -> Self {
        Self(STRING_DATA_TYPE.to_string())
    }

    /// Returns the data type as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the data type is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Key identifying an attribute definition.
///
/// # Invariants
/// - `soa` is the name component of the source of authority; optional
///   identifier components do not participate in definition keying.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionKey {
    /// Source-of-authority name.
    pub soa: String,
    /// Attribute identifier.
    pub attribute_id: AttributeId,
    /// Declared data type.
    pub data_type: DataType,
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.soa, self.attribute_id, self.data_type)
    }
}

/// Attribute definition declared by a source of authority.
///
/// # Invariants
/// - `soa.name`, `attribute_id`, and `data_type` are non-empty once
///   [`AttributeDefinition::validate`] has passed.
/// - An empty `allowed_values` set means any value of the declared data type
///   is allowed.
/// - Definitions are value types; the allowed set is owned, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Source of authority for the attribute.
    pub soa: NameId,
    /// Attribute identifier.
    pub attribute_id: AttributeId,
    /// Declared data type.
    pub data_type: DataType,
    /// Allowed values; empty means unrestricted.
    #[serde(default)]
    pub allowed_values: BTreeSet<String>,
}

impl AttributeDefinition {
    /// Creates a definition with the given allowed values.
    #[must_use]
    pub fn new(
        soa: NameId,
        attribute_id: AttributeId,
        data_type: DataType,
        allowed_values: BTreeSet<String>,
    ) -> Self {
        Self {
            soa,
            attribute_id,
            data_type,
            allowed_values,
        }
    }

    /// Returns the definition key.
    #[must_use]
    pub fn key(&self) -> DefinitionKey {
        DefinitionKey {
            soa: self.soa.name.clone(),
            attribute_id: self.attribute_id.clone(),
            data_type: self.data_type.clone(),
        }
    }

    /// Validates the definition key components.
    ///
    /// # Errors
    ///
    /// Returns the offending component name when the source-of-authority
    /// name, attribute identifier, or data type is empty.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.soa.name.is_empty() {
            return Err("source of authority");
        }
        if self.attribute_id.is_empty() {
            return Err("attribute identifier");
        }
        if self.data_type.is_empty() {
            return Err("data type");
        }
        Ok(())
    }

    /// Returns whether `value` is allowed by this definition.
    ///
    /// An empty allowed set permits every value.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.is_empty() || self.allowed_values.contains(value)
    }
}

// ============================================================================
// SECTION: Value Records
// ============================================================================

/// One stored attribute-value assignment.
///
/// # Invariants
/// - `subject` and `soa` are name components; the authority resolves full
///   identifiers before touching the store.
/// - No uniqueness constraint exists over the record fields; duplicate rows
///   are legal at the store level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValueRecord {
    /// Subject the attribute describes.
    pub subject: String,
    /// Source-of-authority name.
    pub soa: String,
    /// Attribute identifier.
    pub attribute_id: AttributeId,
    /// Declared data type.
    pub data_type: DataType,
    /// Assigned value.
    pub value: String,
}

impl AttributeValueRecord {
    /// Returns the key of the definition this record depends on.
    #[must_use]
    pub fn definition_key(&self) -> DefinitionKey {
        DefinitionKey {
            soa: self.soa.clone(),
            attribute_id: self.attribute_id.clone(),
            data_type: self.data_type.clone(),
        }
    }
}

// ============================================================================
// SECTION: Attribute Payloads
// ============================================================================

/// One value inside an attribute payload.
///
/// # Invariants
/// - `data_type`, when present, overrides the payload-level data type for
///   this value only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// Optional per-value data type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// The value itself.
    pub value: String,
}

impl AttributeValue {
    /// Creates a value with no per-value data type.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            data_type: None,
            value: value.into(),
        }
    }
}

/// Attribute payload carried by requests and attribute statements.
///
/// # Invariants
/// - Mutation operations require exactly one value; assertion queries allow
///   zero (match any) or one. The authority enforces both rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: AttributeId,
    /// Optional name format URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// Optional declared data type; absent means the string data type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    /// Carried values.
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    /// Creates an attribute payload with the given name and values.
    #[must_use]
    pub fn new(name: AttributeId, values: Vec<AttributeValue>) -> Self {
        Self {
            name,
            name_format: None,
            friendly_name: None,
            data_type: None,
            values,
        }
    }

    /// Returns the effective data type, defaulting to the string type.
    #[must_use]
    pub fn effective_data_type(&self) -> DataType {
        self.data_type.clone().unwrap_or_else(DataType::string)
    }

    /// Returns the single carried value when exactly one is present.
    #[must_use]
    pub fn single_value(&self) -> Option<&str> {
        match self.values.as_slice() {
            [only] => Some(&only.value),
            _ => None,
        }
    }
}
