// crates/assertion-server-core/src/core/mod.rs
// ============================================================================
// Module: Assertion Server Core Model
// Description: Data model shared by the authority, builder, and verifier.
// Purpose: Re-export the canonical model types from one namespace.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core model covers identities, attribute definitions and values,
//! validity conditions, signed assertions, and the canonical signing input.
//! Everything here is a plain value type; behavior lives in
//! [`crate::runtime`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod assertion;
pub mod attribute;
pub mod canonical;
pub mod conditions;
pub mod identity;
pub mod request;
pub mod time;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use assertion::AssertionId;
pub use assertion::AttributeStatement;
pub use assertion::SignatureBlob;
pub use assertion::SignedAssertion;
pub use assertion::Statement;
pub use assertion::Subject;
pub use assertion::WireError;
pub use attribute::Attribute;
pub use attribute::AttributeDefinition;
pub use attribute::AttributeId;
pub use attribute::AttributeValue;
pub use attribute::AttributeValueRecord;
pub use attribute::DataType;
pub use attribute::DefinitionKey;
pub use attribute::STRING_DATA_TYPE;
pub use canonical::CanonicalError;
pub use canonical::signing_input;
pub use conditions::Condition;
pub use conditions::Conditions;
pub use conditions::WindowError;
pub use identity::NameId;
pub use identity::NameQualifier;
pub use identity::QualifierKind;
pub use request::AssertionRequest;
pub use time::Timestamp;
