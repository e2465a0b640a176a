// crates/assertion-server-core/tests/authority.rs
// ============================================================================
// Module: Authority Operation Tests
// Description: Validate the attribute authority's operation semantics.
// Purpose: Ensure check ordering, payload rules, and store effects match the
//          operation contracts end to end.
// Dependencies: assertion-server-core
// ============================================================================

//! Attribute authority operation tests over an in-memory store with stub
//! policy, credential, and signing collaborators.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::sync::Arc;

use assertion_server_core::AssertionRequest;
use assertion_server_core::Attribute;
use assertion_server_core::AttributeAuthority;
use assertion_server_core::AttributeDefinition;
use assertion_server_core::AttributeId;
use assertion_server_core::AttributeStore;
use assertion_server_core::AttributeValue;
use assertion_server_core::AuthorityAction;
use assertion_server_core::AuthorityConfig;
use assertion_server_core::AuthorityError;
use assertion_server_core::CredentialChecker;
use assertion_server_core::CredentialError;
use assertion_server_core::DataType;
use assertion_server_core::InMemoryAttributeStore;
use assertion_server_core::NameId;
use assertion_server_core::NoopAuditSink;
use assertion_server_core::PolicyDecision;
use assertion_server_core::PolicyDecisionPoint;
use assertion_server_core::PolicyError;
use assertion_server_core::SignatureBlob;
use assertion_server_core::SigningError;
use assertion_server_core::SigningService;
use assertion_server_core::Statement;
use assertion_server_core::ValueQuery;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Signer stub whose signature is the base64 of the signed bytes.
#[derive(Clone, Copy)]
struct EchoSigner;

impl SigningService for EchoSigner {
    fn sign(&self, canonical: &[u8]) -> Result<SignatureBlob, SigningError> {
        Ok(SignatureBlob {
            algorithm: "echo".to_string(),
            key_id: None,
            value: BASE64.encode(canonical),
        })
    }

    fn verify(&self, canonical: &[u8], signature: &SignatureBlob) -> Result<bool, SigningError> {
        let bytes = BASE64
            .decode(&signature.value)
            .map_err(|err| SigningError::Service(err.to_string()))?;
        Ok(signature.algorithm == "echo" && bytes == canonical)
    }
}

/// Policy stub permitting every action.
struct AllowAll;

impl PolicyDecisionPoint for AllowAll {
    fn decide(
        &self,
        _actor: &NameId,
        _action: &AuthorityAction,
    ) -> Result<PolicyDecision, PolicyError> {
        Ok(PolicyDecision::Permit)
    }
}

/// Credential stub accepting one login and token pair.
struct SingleAccount;

impl CredentialChecker for SingleAccount {
    fn authenticate(&self, identity: &str, token: &[u8]) -> Result<bool, CredentialError> {
        Ok(identity == "operator" && token == b"secret")
    }
}

/// Builds an authority over a fresh in-memory store, returning both.
fn authority() -> Result<(AttributeAuthority, InMemoryAttributeStore), AuthorityError> {
    let store = InMemoryAttributeStore::new();
    let authority = AttributeAuthority::new(
        Arc::new(store.clone()),
        Arc::new(AllowAll),
        Arc::new(SingleAccount),
        Arc::new(EchoSigner),
        Arc::new(NoopAuditSink),
        AuthorityConfig::default(),
    )?;
    Ok((authority, store))
}

/// Builds the membership-level definition used across tests.
fn membership_definition() -> AttributeDefinition {
    let mut allowed = BTreeSet::new();
    allowed.insert("gold".to_string());
    allowed.insert("silver".to_string());
    AttributeDefinition::new(
        NameId::new("soa.example.org"),
        AttributeId::new("membership-level"),
        DataType::string(),
        allowed,
    )
}

/// Builds an attribute payload carrying the given values.
fn payload(values: &[&str]) -> Attribute {
    Attribute::new(
        AttributeId::new("membership-level"),
        values.iter().map(|value| AttributeValue::new(*value)).collect(),
    )
}

#[test]
fn full_attribute_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");

    session.create_attribute(&membership_definition())?;
    session.add_attribute_value(&subject, &soa, &payload(&["gold"]))?;

    let request = AssertionRequest::new(subject.clone(), soa.clone(), payload(&[]));
    let assertions = session.query_assertions(&request)?;
    assert_eq!(assertions.len(), 1);
    let assertion = &assertions[0];
    assert!(assertion.signature.is_some());
    assert_eq!(assertion.issuer.name(), "soa.example.org");
    let Statement::Attribute(statement) = &assertion.statements[0];
    assert_eq!(statement.attributes[0].values.len(), 1);
    assert_eq!(statement.attributes[0].values[0].value, "gold");

    session.update_attribute_value(&subject, &soa, &payload(&["gold"]), "silver")?;
    let assertions = session.query_assertions(&request)?;
    let Statement::Attribute(statement) = &assertions[0].statements[0];
    assert_eq!(statement.attributes[0].values[0].value, "silver");

    session.remove_attribute_value(&subject, &soa, &payload(&["silver"]))?;
    let assertions = session.query_assertions(&request)?;
    let Statement::Attribute(statement) = &assertions[0].statements[0];
    assert!(statement.attributes[0].values.is_empty());
    Ok(())
}

#[test]
fn create_rejects_duplicate_definition() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let result = session.create_attribute(&membership_definition());
    assert!(matches!(result, Err(AuthorityError::AlreadyExists { .. })));
    Ok(())
}

#[test]
fn create_rejects_empty_key_components() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let definition = AttributeDefinition::new(
        NameId::new("soa.example.org"),
        AttributeId::new(""),
        DataType::string(),
        BTreeSet::new(),
    );
    let result = session.create_attribute(&definition);
    assert!(matches!(result, Err(AuthorityError::InvalidDefinition { .. })));
    Ok(())
}

#[test]
fn delete_requires_existing_definition() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let result = session.delete_attribute(&membership_definition());
    assert!(matches!(result, Err(AuthorityError::DefinitionNotFound { .. })));
    Ok(())
}

#[test]
fn delete_cascades_value_records() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    session.create_attribute(&membership_definition())?;
    session.add_attribute_value(&subject, &soa, &payload(&["gold"]))?;
    session.delete_attribute(&membership_definition())?;
    let remaining = store.find_values(&ValueQuery::BySubject {
        subject: "alice".to_string(),
    })?;
    assert!(remaining.is_empty());
    Ok(())
}

#[test]
fn add_requires_exactly_one_value() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    let none = session.add_attribute_value(&subject, &soa, &payload(&[]));
    assert!(matches!(none, Err(AuthorityError::MissingValue { .. })));
    let both = session.add_attribute_value(&subject, &soa, &payload(&["gold", "silver"]));
    assert!(matches!(both, Err(AuthorityError::MultipleValues { .. })));
    Ok(())
}

#[test]
fn add_rejects_value_outside_allowed_set() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    let result = session.add_attribute_value(&subject, &soa, &payload(&["platinum"]));
    assert!(matches!(result, Err(AuthorityError::IllegalValue { .. })));
    Ok(())
}

#[test]
fn add_requires_matching_definition() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    let result = session.add_attribute_value(&subject, &soa, &payload(&["gold"]));
    assert!(matches!(result, Err(AuthorityError::DefinitionNotFound { .. })));
    Ok(())
}

#[test]
fn update_requires_existing_old_value() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    let result = session.update_attribute_value(&subject, &soa, &payload(&["gold"]), "silver");
    assert!(matches!(result, Err(AuthorityError::ValueNotFound)));
    Ok(())
}

#[test]
fn update_rejects_disallowed_new_value() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    session.add_attribute_value(&subject, &soa, &payload(&["gold"]))?;
    let result = session.update_attribute_value(&subject, &soa, &payload(&["gold"]), "platinum");
    assert!(matches!(result, Err(AuthorityError::IllegalValue { .. })));
    Ok(())
}

#[test]
fn remove_missing_value_is_silent_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    session.remove_attribute_value(&subject, &soa, &payload(&["gold"]))?;
    Ok(())
}

#[test]
fn query_rejects_multiple_values() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let request = AssertionRequest::new(
        NameId::new("alice"),
        NameId::new("soa.example.org"),
        payload(&["gold", "silver"]),
    );
    let result = session.query_assertions(&request);
    assert!(matches!(result, Err(AuthorityError::MultipleValues { .. })));
    Ok(())
}

#[test]
fn query_filters_on_requested_value() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    let definition = AttributeDefinition::new(
        soa.clone(),
        AttributeId::new("membership-level"),
        DataType::string(),
        BTreeSet::new(),
    );
    session.create_attribute(&definition)?;
    session.add_attribute_value(&subject, &soa, &payload(&["gold"]))?;
    session.add_attribute_value(&subject, &soa, &payload(&["bronze"]))?;

    let request = AssertionRequest::new(subject.clone(), soa.clone(), payload(&["gold"]));
    let assertions = session.query_assertions(&request)?;
    let Statement::Attribute(statement) = &assertions[0].statements[0];
    assert_eq!(statement.attributes[0].values.len(), 1);
    assert_eq!(statement.attributes[0].values[0].value, "gold");

    let request = AssertionRequest::new(subject, soa, payload(&["platinum"]));
    let assertions = session.query_assertions(&request)?;
    let Statement::Attribute(statement) = &assertions[0].statements[0];
    assert!(statement.attributes[0].values.is_empty());
    Ok(())
}

#[test]
fn query_deduplicates_repeated_values() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    let soa = NameId::new("soa.example.org");
    let subject = NameId::new("alice");
    session.create_attribute(&membership_definition())?;
    session.add_attribute_value(&subject, &soa, &payload(&["gold"]))?;
    session.add_attribute_value(&subject, &soa, &payload(&["gold"]))?;
    let request = AssertionRequest::new(subject, soa, payload(&[]));
    let assertions = session.query_assertions(&request)?;
    let Statement::Attribute(statement) = &assertions[0].statements[0];
    assert_eq!(statement.attributes[0].values.len(), 1);
    Ok(())
}

#[test]
fn query_sets_validity_window() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let session = authority.connect(NameId::new("operator"), b"secret")?;
    session.create_attribute(&membership_definition())?;
    let request = AssertionRequest::new(
        NameId::new("alice"),
        NameId::new("soa.example.org"),
        payload(&[]),
    );
    let assertions = session.query_assertions(&request)?;
    let conditions = assertions[0].conditions.as_ref().unwrap();
    let not_before = conditions.not_before.unwrap();
    let not_on_or_after = conditions.not_on_or_after.unwrap();
    let window_ms = not_on_or_after.as_unix_millis() - not_before.as_unix_millis();
    assert_eq!(window_ms, 86_400_000);
    Ok(())
}

#[test]
fn connect_rejects_bad_credentials() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let result = authority.connect(NameId::new("operator"), b"wrong");
    assert!(matches!(result, Err(AuthorityError::AuthenticationFailed)));
    let result = authority.connect(NameId::new("mallory"), b"secret");
    assert!(matches!(result, Err(AuthorityError::AuthenticationFailed)));
    Ok(())
}

#[test]
fn disconnect_invalidates_session() -> Result<(), Box<dyn std::error::Error>> {
    let (authority, _store) = authority()?;
    let mut session = authority.connect(NameId::new("operator"), b"secret")?;
    assert!(session.actor().is_some());
    session.disconnect();
    assert!(session.actor().is_none());
    let result = session.create_attribute(&membership_definition());
    assert!(matches!(result, Err(AuthorityError::NotAuthenticated)));
    Ok(())
}

#[test]
fn zero_validity_config_is_rejected() {
    let store = InMemoryAttributeStore::new();
    let result = AttributeAuthority::new(
        Arc::new(store),
        Arc::new(AllowAll),
        Arc::new(SingleAccount),
        Arc::new(EchoSigner),
        Arc::new(NoopAuditSink),
        AuthorityConfig {
            default_validity_secs: 0,
        },
    );
    assert!(matches!(result, Err(AuthorityError::InvalidConfig(_))));
}
