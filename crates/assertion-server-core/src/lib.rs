// crates/assertion-server-core/src/lib.rs
// ============================================================================
// Module: Assertion Server Core
// Description: Attribute authority model, interfaces, and runtime.
// Purpose: Issue and verify signed attribute assertions over a
//          permission-checked attribute store.
// Dependencies: serde, serde_jcs, thiserror, time, rand, base64
// ============================================================================

//! ## Overview
//! Assertion Server Core is the engine of an attribute authority. Sources of
//! authority define attributes and assign values to subjects; relying parties
//! query those attributes and receive signed, time-bounded assertions in
//! return. Every operation is authenticated, permission-checked against an
//! injected policy decision point, and audited.
//!
//! The crate splits into three layers:
//! - [`core`]: the data model (identities, attributes, conditions, signed
//!   assertions, canonical signing input).
//! - [`interfaces`]: the backend contracts the authority consumes (attribute
//!   store, policy decision point, credential checker, signing service,
//!   audit sink).
//! - [`runtime`]: the behavior ([`AttributeAuthority`], [`AssertionBuilder`],
//!   [`AssertionVerifier`], and an in-memory store).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::AssertionId;
pub use crate::core::AssertionRequest;
pub use crate::core::Attribute;
pub use crate::core::AttributeDefinition;
pub use crate::core::AttributeId;
pub use crate::core::AttributeStatement;
pub use crate::core::AttributeValue;
pub use crate::core::AttributeValueRecord;
pub use crate::core::CanonicalError;
pub use crate::core::Condition;
pub use crate::core::Conditions;
pub use crate::core::DataType;
pub use crate::core::DefinitionKey;
pub use crate::core::NameId;
pub use crate::core::NameQualifier;
pub use crate::core::QualifierKind;
pub use crate::core::STRING_DATA_TYPE;
pub use crate::core::SignatureBlob;
pub use crate::core::SignedAssertion;
pub use crate::core::Statement;
pub use crate::core::Subject;
pub use crate::core::Timestamp;
pub use crate::core::WindowError;
pub use crate::core::WireError;
pub use crate::core::signing_input;
pub use crate::interfaces::ActionKind;
pub use crate::interfaces::AttributeStore;
pub use crate::interfaces::AuditOutcome;
pub use crate::interfaces::AuditSink;
pub use crate::interfaces::AuthorityAction;
pub use crate::interfaces::AuthorityEvent;
pub use crate::interfaces::AuthorityOperation;
pub use crate::interfaces::CredentialChecker;
pub use crate::interfaces::CredentialError;
pub use crate::interfaces::NoopAuditSink;
pub use crate::interfaces::PolicyDecision;
pub use crate::interfaces::PolicyDecisionPoint;
pub use crate::interfaces::PolicyError;
pub use crate::interfaces::SigningError;
pub use crate::interfaces::SigningService;
pub use crate::interfaces::StoreError;
pub use crate::interfaces::ValueQuery;
pub use crate::runtime::AssertionBuilder;
pub use crate::runtime::AssertionVerifier;
pub use crate::runtime::AttributeAuthority;
pub use crate::runtime::AuthorityConfig;
pub use crate::runtime::AuthorityError;
pub use crate::runtime::AuthoritySession;
pub use crate::runtime::BuildError;
pub use crate::runtime::InMemoryAttributeStore;
pub use crate::runtime::RequestResult;
pub use crate::runtime::VerificationError;
