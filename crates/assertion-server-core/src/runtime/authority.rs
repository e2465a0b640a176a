// crates/assertion-server-core/src/runtime/authority.rs
// ============================================================================
// Module: Attribute Authority
// Description: Permission-checked orchestrator over the attribute store and
//              assertion builder.
// Purpose: Enforce authenticate-before-act and decide-before-mutate for
//          every attribute operation and assertion query.
// Dependencies: crate::core, crate::interfaces, crate::runtime::builder,
//               serde, thiserror
// ============================================================================

//! ## Overview
//! The authority is the single entry point for clients. `connect` produces a
//! session bound to one authenticated actor; every session operation follows
//! the same shape: validate the payload, ask the policy decision point,
//! touch the store, record an audit event, return a typed result. Permission
//! is decided before any store mutation, and each check-then-act sequence
//! holds one operation lock so a concurrent definition delete cannot race an
//! in-flight value insert.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::AssertionRequest;
use crate::core::Attribute;
use crate::core::AttributeDefinition;
use crate::core::AttributeStatement;
use crate::core::AttributeValue;
use crate::core::AttributeValueRecord;
use crate::core::Conditions;
use crate::core::DefinitionKey;
use crate::core::NameId;
use crate::core::SignedAssertion;
use crate::core::Statement;
use crate::core::Subject;
use crate::core::Timestamp;
use crate::interfaces::ActionKind;
use crate::interfaces::AttributeStore;
use crate::interfaces::AuditOutcome;
use crate::interfaces::AuditSink;
use crate::interfaces::AuthorityAction;
use crate::interfaces::AuthorityEvent;
use crate::interfaces::AuthorityOperation;
use crate::interfaces::CredentialChecker;
use crate::interfaces::CredentialError;
use crate::interfaces::PolicyDecision;
use crate::interfaces::PolicyDecisionPoint;
use crate::interfaces::PolicyError;
use crate::interfaces::SigningService;
use crate::interfaces::StoreError;
use crate::interfaces::ValueQuery;
use crate::runtime::builder::AssertionBuilder;
use crate::runtime::builder::BuildError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authority operation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling; display texts preserve
///   the historical decision-point messages.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// No actor is authenticated on this session.
    #[error("no authenticated actor on this session")]
    NotAuthenticated,
    /// Credential check rejected the actor.
    #[error("user authentication failed")]
    AuthenticationFailed,
    /// A definition key component is empty.
    #[error("{component} must be non-empty in an attribute definition")]
    InvalidDefinition {
        /// Offending key component.
        component: &'static str,
    },
    /// A definition with the same key already exists.
    #[error("attempt to re-create existing attribute definition: {key}")]
    AlreadyExists {
        /// Conflicting definition key.
        key: DefinitionKey,
    },
    /// No definition matches the key.
    #[error("attribute definition does not exist: {key}")]
    DefinitionNotFound {
        /// Missing definition key.
        key: DefinitionKey,
    },
    /// The old attribute value to update does not exist.
    #[error("trying to update nonexistent attribute value")]
    ValueNotFound,
    /// The policy decision point denied the action.
    #[error("permission to {} denied", action.as_str())]
    PermissionDenied {
        /// Denied action kind.
        action: ActionKind,
    },
    /// The payload carried no value where exactly one is required.
    #[error("cannot {} without a value", operation.as_str())]
    MissingValue {
        /// Operation that rejected the payload.
        operation: AuthorityOperation,
    },
    /// The payload carried several values where at most one is allowed.
    #[error("cannot carry several values in one {} request", operation.as_str())]
    MultipleValues {
        /// Operation that rejected the payload.
        operation: AuthorityOperation,
    },
    /// The value is outside the definition's allowed set.
    #[error("illegal value for attribute: {value}")]
    IllegalValue {
        /// Rejected value.
        value: String,
    },
    /// The authority configuration is invalid.
    #[error("invalid authority configuration: {0}")]
    InvalidConfig(String),
    /// The attribute store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The policy decision point failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The credential checker failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// Assertion construction failed.
    #[error("error while creating assertion: {0}")]
    Build(#[from] BuildError),
}

/// Result type of every authority operation.
pub type RequestResult<T = ()> = Result<T, AuthorityError>;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default assertion validity period in seconds (one day).
const DEFAULT_VALIDITY_SECS: u64 = 86_400;

/// Returns the default validity period in seconds.
const fn default_validity_secs() -> u64 {
    DEFAULT_VALIDITY_SECS
}

/// Authority configuration.
///
/// # Invariants
/// - `default_validity_secs` is greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorityConfig {
    /// Validity period applied to issued assertions, in seconds.
    #[serde(default = "default_validity_secs")]
    pub default_validity_secs: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            default_validity_secs: DEFAULT_VALIDITY_SECS,
        }
    }
}

impl AuthorityConfig {
    /// Returns the default validity period as a duration.
    #[must_use]
    pub const fn default_validity(&self) -> Duration {
        Duration::from_secs(self.default_validity_secs)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), AuthorityError> {
        if self.default_validity_secs == 0 {
            return Err(AuthorityError::InvalidConfig(
                "default_validity_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Authority
// ============================================================================

/// Collaborators and configuration shared by all sessions.
struct AuthorityInner {
    /// Attribute store.
    store: Arc<dyn AttributeStore>,
    /// Policy decision point.
    pdp: Arc<dyn PolicyDecisionPoint>,
    /// Credential checker.
    credentials: Arc<dyn CredentialChecker>,
    /// Assertion builder.
    builder: AssertionBuilder,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
    /// Authority configuration.
    config: AuthorityConfig,
    /// Lock spanning each check-then-act sequence.
    op_lock: Mutex<()>,
}

impl AuthorityInner {
    /// Acquires the operation lock, recovering from poisoning.
    fn op_guard(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Permission-checked attribute authority.
///
/// One authority instance is shared by many sessions; all per-caller state
/// lives in the [`AuthoritySession`] values it hands out.
#[derive(Clone)]
pub struct AttributeAuthority {
    /// Shared collaborators and configuration.
    inner: Arc<AuthorityInner>,
}

impl AttributeAuthority {
    /// Creates an authority over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::InvalidConfig`] when the configuration is
    /// invalid; configuration errors are fatal at startup and never become
    /// request-level failures.
    pub fn new(
        store: Arc<dyn AttributeStore>,
        pdp: Arc<dyn PolicyDecisionPoint>,
        credentials: Arc<dyn CredentialChecker>,
        signer: Arc<dyn SigningService>,
        audit: Arc<dyn AuditSink>,
        config: AuthorityConfig,
    ) -> Result<Self, AuthorityError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(AuthorityInner {
                store,
                pdp,
                credentials,
                builder: AssertionBuilder::new(signer),
                audit,
                config,
                op_lock: Mutex::new(()),
            }),
        })
    }

    /// Authenticates an actor and opens a session for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::AuthenticationFailed`] when the credential
    /// check rejects the token, and propagates credential backend failures.
    pub fn connect(&self, actor: NameId, token: &[u8]) -> RequestResult<AuthoritySession> {
        let result = self
            .inner
            .credentials
            .authenticate(actor.name(), token)
            .map_err(AuthorityError::from)
            .and_then(|authenticated| {
                if authenticated {
                    Ok(())
                } else {
                    Err(AuthorityError::AuthenticationFailed)
                }
            });
        record_event(
            self.inner.audit.as_ref(),
            Some(actor.name().to_string()),
            AuthorityOperation::Connect,
            None,
            &result,
        );
        result.map(|()| AuthoritySession {
            inner: Arc::clone(&self.inner),
            actor: Some(actor),
        })
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// One actor's authenticated session with the authority.
///
/// # Invariants
/// - `actor` is `Some` from successful `connect` until `disconnect`.
/// - Sessions are not shared across callers; each logical caller holds its
///   own session value.
pub struct AuthoritySession {
    /// Shared collaborators and configuration.
    inner: Arc<AuthorityInner>,
    /// Authenticated actor, cleared by disconnect.
    actor: Option<NameId>,
}

impl AuthoritySession {
    /// Returns the authenticated actor, when still connected.
    #[must_use]
    pub fn actor(&self) -> Option<&NameId> {
        self.actor.as_ref()
    }

    /// Clears the session's actor.
    ///
    /// Every subsequent operation on this session fails with
    /// [`AuthorityError::NotAuthenticated`].
    pub fn disconnect(&mut self) {
        let actor = self.actor.take().map(|actor| actor.name().to_string());
        record_event(
            self.inner.audit.as_ref(),
            actor,
            AuthorityOperation::Disconnect,
            None,
            &Ok(()),
        );
    }

    /// Creates a new attribute definition.
    ///
    /// Fails when a definition with the same key already exists; otherwise
    /// checks permission for the create action and inserts.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] describing the first failed check.
    pub fn create_attribute(&self, definition: &AttributeDefinition) -> RequestResult {
        let result = self.create_attribute_inner(definition);
        self.record(
            AuthorityOperation::CreateAttribute,
            Some(definition.key().to_string()),
            &result,
        );
        result
    }

    /// Core of [`Self::create_attribute`], audited by the wrapper.
    fn create_attribute_inner(&self, definition: &AttributeDefinition) -> RequestResult {
        let actor = self.require_actor()?;
        if let Err(component) = definition.validate() {
            return Err(AuthorityError::InvalidDefinition {
                component,
            });
        }
        let _guard = self.inner.op_guard();
        let key = definition.key();
        if !self.inner.store.find_definitions(&key)?.is_empty() {
            return Err(AuthorityError::AlreadyExists {
                key,
            });
        }
        self.check_permission(&actor, ActionKind::Create, vec![definition.clone()], None)?;
        self.inner.store.insert_definition(definition)?;
        Ok(())
    }

    /// Deletes an attribute definition and every associated value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError::DefinitionNotFound`] when no definition
    /// matches, [`AuthorityError::PermissionDenied`] on denial, and store
    /// errors otherwise.
    pub fn delete_attribute(&self, definition: &AttributeDefinition) -> RequestResult {
        let result = self.delete_attribute_inner(definition);
        self.record(
            AuthorityOperation::DeleteAttribute,
            Some(definition.key().to_string()),
            &result,
        );
        result
    }

    /// Core of [`Self::delete_attribute`], audited by the wrapper.
    fn delete_attribute_inner(&self, definition: &AttributeDefinition) -> RequestResult {
        let actor = self.require_actor()?;
        let _guard = self.inner.op_guard();
        let key = definition.key();
        if self.inner.store.find_definitions(&key)?.is_empty() {
            return Err(AuthorityError::DefinitionNotFound {
                key,
            });
        }
        self.check_permission(&actor, ActionKind::Delete, vec![definition.clone()], None)?;
        self.inner.store.delete_definition(&key)?;
        Ok(())
    }

    /// Adds an attribute value for a subject.
    ///
    /// The payload must carry exactly one value; the matching definition
    /// must exist and allow the value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] describing the first failed check.
    pub fn add_attribute_value(
        &self,
        subject: &NameId,
        soa: &NameId,
        attribute: &Attribute,
    ) -> RequestResult {
        let result = self.add_attribute_value_inner(subject, soa, attribute);
        self.record(
            AuthorityOperation::AddValue,
            Some(format!("{}:{} for {}", soa.name(), attribute.name, subject.name())),
            &result,
        );
        result
    }

    /// Core of [`Self::add_attribute_value`], audited by the wrapper.
    fn add_attribute_value_inner(
        &self,
        subject: &NameId,
        soa: &NameId,
        attribute: &Attribute,
    ) -> RequestResult {
        let actor = self.require_actor()?;
        let value = single_value(attribute, AuthorityOperation::AddValue)?;
        let data_type = attribute.effective_data_type();
        let target = AttributeDefinition::new(
            soa.clone(),
            attribute.name.clone(),
            data_type,
            BTreeSet::new(),
        );
        let _guard = self.inner.op_guard();
        self.check_permission(
            &actor,
            ActionKind::Add,
            vec![target.clone()],
            Some(subject.clone()),
        )?;
        let key = target.key();
        let definitions = self.inner.store.find_definitions(&key)?;
        let Some(definition) = definitions.first() else {
            return Err(AuthorityError::DefinitionNotFound {
                key,
            });
        };
        if !definition.allows(value) {
            return Err(AuthorityError::IllegalValue {
                value: value.to_string(),
            });
        }
        self.inner.store.insert_value(&AttributeValueRecord {
            subject: subject.name().to_string(),
            soa: key.soa,
            attribute_id: key.attribute_id,
            data_type: key.data_type,
            value: value.to_string(),
        })?;
        Ok(())
    }

    /// Updates an existing attribute value for a subject.
    ///
    /// The old payload must carry exactly one value that currently exists;
    /// the new value must be allowed by the definition.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] describing the first failed check.
    pub fn update_attribute_value(
        &self,
        subject: &NameId,
        soa: &NameId,
        old_attribute: &Attribute,
        new_value: &str,
    ) -> RequestResult {
        let result = self.update_attribute_value_inner(subject, soa, old_attribute, new_value);
        self.record(
            AuthorityOperation::UpdateValue,
            Some(format!("{}:{} for {}", soa.name(), old_attribute.name, subject.name())),
            &result,
        );
        result
    }

    /// Core of [`Self::update_attribute_value`], audited by the wrapper.
    fn update_attribute_value_inner(
        &self,
        subject: &NameId,
        soa: &NameId,
        old_attribute: &Attribute,
        new_value: &str,
    ) -> RequestResult {
        let actor = self.require_actor()?;
        let old_value = single_value(old_attribute, AuthorityOperation::UpdateValue)?;
        let data_type = old_attribute.effective_data_type();
        let target = AttributeDefinition::new(
            soa.clone(),
            old_attribute.name.clone(),
            data_type,
            BTreeSet::new(),
        );
        let key = target.key();
        let _guard = self.inner.op_guard();
        let old_record = AttributeValueRecord {
            subject: subject.name().to_string(),
            soa: key.soa.clone(),
            attribute_id: key.attribute_id.clone(),
            data_type: key.data_type.clone(),
            value: old_value.to_string(),
        };
        let existing = self.inner.store.find_values(&ValueQuery::BySubjectAttribute {
            subject: old_record.subject.clone(),
            soa: old_record.soa.clone(),
            attribute_id: old_record.attribute_id.clone(),
            data_type: old_record.data_type.clone(),
        })?;
        if !existing.iter().any(|record| record.value == old_value) {
            return Err(AuthorityError::ValueNotFound);
        }
        self.check_permission(
            &actor,
            ActionKind::Update,
            vec![target.clone()],
            Some(subject.clone()),
        )?;
        let definitions = self.inner.store.find_definitions(&key)?;
        let Some(definition) = definitions.first() else {
            return Err(AuthorityError::DefinitionNotFound {
                key,
            });
        };
        if !definition.allows(new_value) {
            return Err(AuthorityError::IllegalValue {
                value: new_value.to_string(),
            });
        }
        self.inner.store.update_value(&old_record, new_value)?;
        Ok(())
    }

    /// Removes an attribute value from a subject.
    ///
    /// The payload must carry exactly one value. Removing a value that does
    /// not exist is a silent no-op success; this asymmetry with the update
    /// path is intentional remove semantics.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] describing the first failed check.
    pub fn remove_attribute_value(
        &self,
        subject: &NameId,
        soa: &NameId,
        attribute: &Attribute,
    ) -> RequestResult {
        let result = self.remove_attribute_value_inner(subject, soa, attribute);
        self.record(
            AuthorityOperation::RemoveValue,
            Some(format!("{}:{} for {}", soa.name(), attribute.name, subject.name())),
            &result,
        );
        result
    }

    /// Core of [`Self::remove_attribute_value`], audited by the wrapper.
    fn remove_attribute_value_inner(
        &self,
        subject: &NameId,
        soa: &NameId,
        attribute: &Attribute,
    ) -> RequestResult {
        let actor = self.require_actor()?;
        let value = single_value(attribute, AuthorityOperation::RemoveValue)?;
        let data_type = attribute.effective_data_type();
        let target = AttributeDefinition::new(
            soa.clone(),
            attribute.name.clone(),
            data_type,
            BTreeSet::new(),
        );
        let key = target.key();
        let _guard = self.inner.op_guard();
        self.check_permission(&actor, ActionKind::Delete, vec![target], Some(subject.clone()))?;
        self.inner.store.delete_value(&AttributeValueRecord {
            subject: subject.name().to_string(),
            soa: key.soa,
            attribute_id: key.attribute_id,
            data_type: key.data_type,
            value: value.to_string(),
        })?;
        Ok(())
    }

    /// Queries attribute assertions for a subject.
    ///
    /// The queried attribute carries zero values to match any value, or one
    /// to match that value alone. On permit, all matching values are
    /// deduplicated into one attribute statement and returned inside a
    /// single signed assertion valid from now for the configured period.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorityError`] describing the first failed check or the
    /// assertion construction failure.
    pub fn query_assertions(
        &self,
        request: &AssertionRequest,
    ) -> RequestResult<Vec<SignedAssertion>> {
        let result = self.query_assertions_inner(request);
        self.record(
            AuthorityOperation::QueryAssertions,
            Some(format!(
                "{}:{} for {}",
                request.issuer.name(),
                request.attribute.name,
                request.subject.name()
            )),
            &result,
        );
        result
    }

    /// Core of [`Self::query_assertions`], audited by the wrapper.
    fn query_assertions_inner(
        &self,
        request: &AssertionRequest,
    ) -> RequestResult<Vec<SignedAssertion>> {
        let actor = self.require_actor()?;
        if request.attribute.values.len() > 1 {
            return Err(AuthorityError::MultipleValues {
                operation: AuthorityOperation::QueryAssertions,
            });
        }
        let wanted = request.attribute.values.first().map(|value| value.value.clone());
        let data_type = request.attribute.effective_data_type();
        let target = AttributeDefinition::new(
            request.issuer.clone(),
            request.attribute.name.clone(),
            data_type.clone(),
            BTreeSet::new(),
        );
        let _guard = self.inner.op_guard();
        self.check_permission(
            &actor,
            ActionKind::Query,
            vec![target],
            Some(request.subject.clone()),
        )?;
        let records = self.inner.store.find_values(&ValueQuery::BySubjectAttribute {
            subject: request.subject.name().to_string(),
            soa: request.issuer.name().to_string(),
            attribute_id: request.attribute.name.clone(),
            data_type: data_type.clone(),
        })?;
        let values: BTreeSet<String> = records
            .into_iter()
            .filter(|record| wanted.as_ref().is_none_or(|wanted| *wanted == record.value))
            .map(|record| record.value)
            .collect();
        let attribute = Attribute {
            name: request.attribute.name.clone(),
            name_format: request.attribute.name_format.clone(),
            friendly_name: request.attribute.friendly_name.clone(),
            data_type: Some(data_type),
            values: values.into_iter().map(AttributeValue::new).collect(),
        };
        let statement = Statement::Attribute(AttributeStatement {
            attributes: vec![attribute],
        });
        let now = Timestamp::now();
        let conditions = Conditions::window(
            Some(now),
            Some(now.saturating_add(self.inner.config.default_validity())),
        );
        let assertion = self.inner.builder.build(
            request.issuer.clone(),
            Some(Subject::new(request.subject.clone())),
            Some(conditions),
            vec![statement],
        )?;
        Ok(vec![assertion])
    }

    /// Returns the session actor or fails as not authenticated.
    fn require_actor(&self) -> Result<NameId, AuthorityError> {
        self.actor.clone().ok_or(AuthorityError::NotAuthenticated)
    }

    /// Asks the policy decision point and fails closed.
    ///
    /// A decision error is propagated, never interpreted as a permit.
    fn check_permission(
        &self,
        actor: &NameId,
        kind: ActionKind,
        targets: Vec<AttributeDefinition>,
        subject: Option<NameId>,
    ) -> RequestResult {
        let action = AuthorityAction {
            kind,
            targets,
            subject,
        };
        match self.inner.pdp.decide(actor, &action)? {
            PolicyDecision::Permit => Ok(()),
            PolicyDecision::Deny => Err(AuthorityError::PermissionDenied {
                action: kind,
            }),
        }
    }

    /// Records an audit event for an operation outcome.
    fn record<T>(
        &self,
        operation: AuthorityOperation,
        target: Option<String>,
        result: &RequestResult<T>,
    ) {
        record_event(
            self.inner.audit.as_ref(),
            self.actor.as_ref().map(|actor| actor.name().to_string()),
            operation,
            target,
            result,
        );
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the exactly-one value a mutation payload must carry.
fn single_value(
    attribute: &Attribute,
    operation: AuthorityOperation,
) -> Result<&str, AuthorityError> {
    match attribute.values.as_slice() {
        [] => Err(AuthorityError::MissingValue {
            operation,
        }),
        [only] => Ok(&only.value),
        _ => Err(AuthorityError::MultipleValues {
            operation,
        }),
    }
}

/// Emits one audit event describing an operation outcome.
fn record_event<T>(
    audit: &dyn AuditSink,
    actor: Option<String>,
    operation: AuthorityOperation,
    target: Option<String>,
    result: &RequestResult<T>,
) {
    let (outcome, reason) = match result {
        Ok(_) => (AuditOutcome::Success, None),
        Err(err) => (AuditOutcome::Failure, Some(err.to_string())),
    };
    audit.record(&AuthorityEvent {
        actor,
        operation,
        target,
        outcome,
        reason,
        at: Timestamp::now(),
    });
}
