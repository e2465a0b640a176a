// crates/assertion-server-core/src/interfaces/mod.rs
// ============================================================================
// Module: Assertion Server Interfaces
// Description: Backend-agnostic interfaces for storage, policy, credentials,
//              signing, and audit.
// Purpose: Define the contract surfaces the authority runtime consumes.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the authority integrates with external systems
//! without embedding backend-specific details. Implementations must be
//! deterministic and fail closed: a collaborator error is never treated as a
//! permit, a match, or a valid signature.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AttributeDefinition;
use crate::core::AttributeId;
use crate::core::AttributeValueRecord;
use crate::core::DataType;
use crate::core::DefinitionKey;
use crate::core::NameId;
use crate::core::SignatureBlob;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Attribute Store
// ============================================================================

/// Attribute store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages preserve the underlying storage failure text.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Store I/O error.
    #[error("attribute store io error: {0}")]
    Io(String),
    /// Underlying storage engine error.
    #[error("attribute store error: {0}")]
    Store(String),
    /// Store data is invalid or corrupted.
    #[error("attribute store invalid data: {0}")]
    Invalid(String),
    /// Store schema version is incompatible.
    #[error("attribute store version mismatch: {0}")]
    VersionMismatch(String),
}

/// Supported attribute-value query shapes.
///
/// The store answers exactly three questions: what does this subject hold,
/// who holds this attribute, and does this subject hold this attribute.
/// Making the shapes an enum keeps ambiguous parameter combinations
/// unrepresentable.
///
/// # Invariants
/// - `subject` and `soa` are name components, matching what records store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ValueQuery {
    /// All records for one subject.
    BySubject {
        /// Subject name.
        subject: String,
    },
    /// All subjects holding one attribute.
    ByAttribute {
        /// Source-of-authority name.
        soa: String,
        /// Attribute identifier.
        attribute_id: AttributeId,
        /// Declared data type.
        data_type: DataType,
    },
    /// Records for one subject and one attribute.
    BySubjectAttribute {
        /// Subject name.
        subject: String,
        /// Source-of-authority name.
        soa: String,
        /// Attribute identifier.
        attribute_id: AttributeId,
        /// Declared data type.
        data_type: DataType,
    },
}

/// Backend-agnostic store for attribute definitions and value records.
///
/// Implementations must make every method atomic with respect to every other
/// method: the authority serializes its own check-then-act sequences, but
/// individual store calls may arrive concurrently from other sessions.
pub trait AttributeStore: Send + Sync {
    /// Finds definitions matching the key exactly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_definitions(&self, key: &DefinitionKey) -> Result<Vec<AttributeDefinition>, StoreError>;

    /// Inserts an attribute definition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_definition(&self, definition: &AttributeDefinition) -> Result<(), StoreError>;

    /// Deletes a definition and every value record matching its key.
    ///
    /// Both effects apply in the same logical unit: a crash between them must
    /// never leave orphaned value rows visible to later reads.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_definition(&self, key: &DefinitionKey) -> Result<(), StoreError>;

    /// Finds value records matching the query shape.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_values(&self, query: &ValueQuery) -> Result<Vec<AttributeValueRecord>, StoreError>;

    /// Inserts a value record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_value(&self, record: &AttributeValueRecord) -> Result<(), StoreError>;

    /// Rewrites the value of records matching `old` to `new_value`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn update_value(&self, old: &AttributeValueRecord, new_value: &str) -> Result<(), StoreError>;

    /// Deletes records matching `record` exactly. Deleting a record that
    /// does not exist is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_value(&self, record: &AttributeValueRecord) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Policy Decision Point
// ============================================================================

/// Action kinds the authority asks the policy decision point about.
///
/// # Invariants
/// - Variants are stable for policy rule matching and audit labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Create an attribute definition.
    Create,
    /// Delete an attribute definition.
    Delete,
    /// Add an attribute value.
    Add,
    /// Remove an attribute value.
    Remove,
    /// Update an attribute value.
    Update,
    /// Query attribute assertions.
    Query,
}

impl ActionKind {
    /// Returns a stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Query => "query",
        }
    }
}

/// Action submitted for a policy decision.
///
/// # Invariants
/// - `targets` lists the attribute definitions the action touches.
/// - `subject` is present for value-level actions and queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityAction {
    /// Action kind.
    pub kind: ActionKind,
    /// Attribute definitions the action targets.
    pub targets: Vec<AttributeDefinition>,
    /// Optional subject the action concerns.
    pub subject: Option<NameId>,
}

/// Policy decision outcome.
///
/// # Invariants
/// - Variants are stable and exhaustive for authorization outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Permit the action.
    Permit,
    /// Deny the action.
    Deny,
}

/// Policy decision errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Policy engine reported an error.
    #[error("policy decision error: {0}")]
    DecisionFailed(String),
}

/// Policy decision point consulted before every operation.
pub trait PolicyDecisionPoint: Send + Sync {
    /// Decides whether the actor may perform the action.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when policy evaluation fails; the authority
    /// treats evaluation failure as a denial.
    fn decide(&self, actor: &NameId, action: &AuthorityAction)
    -> Result<PolicyDecision, PolicyError>;
}

// ============================================================================
// SECTION: Credential Checker
// ============================================================================

/// Credential check errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - An unknown identity is a `false` authentication, never an error.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Credential backend reported an error.
    #[error("credential check error: {0}")]
    Backend(String),
}

/// Authenticates an actor identity against an opaque token.
pub trait CredentialChecker: Send + Sync {
    /// Returns whether `identity` is authenticated by `token`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when the check cannot be performed.
    fn authenticate(&self, identity: &str, token: &[u8]) -> Result<bool, CredentialError>;
}

// ============================================================================
// SECTION: Signing Service
// ============================================================================

/// Signing service errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The service holds no signing key.
    #[error("signing service has no signing key")]
    NoSigningKey,
    /// Signature creation or verification failed.
    #[error("signing service error: {0}")]
    Service(String),
}

/// Produces and checks detached signatures over canonical bytes.
///
/// The canonical encoding is produced by [`crate::core::signing_input`];
/// implementations treat the bytes as opaque.
pub trait SigningService: Send + Sync {
    /// Signs the canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when no key is available or signing fails.
    fn sign(&self, canonical: &[u8]) -> Result<SignatureBlob, SigningError>;

    /// Verifies a signature over the canonical bytes.
    ///
    /// Returns `Ok(false)` for a well-formed but incorrect signature;
    /// errors are reserved for malformed blobs and service failures.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] when the blob cannot be interpreted.
    fn verify(&self, canonical: &[u8], signature: &SignatureBlob) -> Result<bool, SigningError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Operations the authority audits.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityOperation {
    /// Actor connection.
    Connect,
    /// Actor disconnection.
    Disconnect,
    /// Attribute definition creation.
    CreateAttribute,
    /// Attribute definition deletion.
    DeleteAttribute,
    /// Attribute value addition.
    AddValue,
    /// Attribute value removal.
    RemoveValue,
    /// Attribute value update.
    UpdateValue,
    /// Assertion query.
    QueryAssertions,
}

impl AuthorityOperation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::CreateAttribute => "create_attribute",
            Self::DeleteAttribute => "delete_attribute",
            Self::AddValue => "add_value",
            Self::RemoveValue => "remove_value",
            Self::UpdateValue => "update_value",
            Self::QueryAssertions => "query_assertions",
        }
    }
}

/// Audit event outcome.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Failure,
}

/// Structured record of one authority operation outcome.
///
/// # Invariants
/// - `reason` is present exactly when the outcome is a failure.
/// - Events never embed attribute values or credential material beyond what
///   the operation already exposes to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorityEvent {
    /// Acting identity name, when a session was established.
    pub actor: Option<String>,
    /// Operation performed.
    pub operation: AuthorityOperation,
    /// Target description (definition key or subject), when applicable.
    pub target: Option<String>,
    /// Operation outcome.
    pub outcome: AuditOutcome,
    /// Failure reason, for failure outcomes.
    pub reason: Option<String>,
    /// Instant the event was recorded.
    pub at: Timestamp,
}

/// Sink receiving authority audit events.
///
/// Implementations must not fail; auditing is observational and never blocks
/// or alters an operation's result.
pub trait AuditSink: Send + Sync {
    /// Records one audit event.
    fn record(&self, event: &AuthorityEvent);
}

/// Audit sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuthorityEvent) {}
}
