// crates/assertion-server-core/tests/verification.rs
// ============================================================================
// Module: Assertion Verification Tests
// Description: Validate assertion construction and verification behavior.
// Purpose: Ensure validity window edges, signature checks, and wire round
//          trips behave as relying parties depend on.
// Dependencies: assertion-server-core, proptest
// ============================================================================

//! Builder and verifier tests: window edge semantics, tamper detection,
//! wire round trips, and window evaluation properties.

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

use std::sync::Arc;
use std::time::Duration;

use assertion_server_core::AssertionBuilder;
use assertion_server_core::AssertionVerifier;
use assertion_server_core::Attribute;
use assertion_server_core::AttributeId;
use assertion_server_core::AttributeStatement;
use assertion_server_core::AttributeValue;
use assertion_server_core::Conditions;
use assertion_server_core::NameId;
use assertion_server_core::SignatureBlob;
use assertion_server_core::SignedAssertion;
use assertion_server_core::SigningError;
use assertion_server_core::SigningService;
use assertion_server_core::Statement;
use assertion_server_core::Subject;
use assertion_server_core::Timestamp;
use assertion_server_core::VerificationError;
use assertion_server_core::WindowError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use proptest::prelude::*;

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

/// Builds one signed assertion with the given validity window.
fn build_assertion(
    conditions: Option<Conditions>,
) -> Result<SignedAssertion, Box<dyn std::error::Error>> {
    let builder = AssertionBuilder::new(Arc::new(EchoSigner));
    let statement = Statement::Attribute(AttributeStatement {
        attributes: vec![Attribute::new(
            AttributeId::new("membership-level"),
            vec![AttributeValue::new("gold")],
        )],
    });
    Ok(builder.build(
        NameId::new("soa.example.org"),
        Some(Subject::new(NameId::new("alice"))),
        conditions,
        vec![statement],
    )?)
}

#[test]
fn built_assertion_verifies() -> Result<(), Box<dyn std::error::Error>> {
    let assertion = build_assertion(None)?;
    let verifier = AssertionVerifier::new(Arc::new(EchoSigner));
    verifier.verify(&assertion)?;
    assert!(assertion.id.as_str().starts_with('_'));
    Ok(())
}

#[test]
fn window_bounds_are_inclusive_exclusive() -> Result<(), Box<dyn std::error::Error>> {
    let not_before = Timestamp::from_unix_millis(1_000_000);
    let not_on_or_after = not_before.saturating_add(Duration::from_secs(3600));
    let assertion = build_assertion(Some(Conditions::window(
        Some(not_before),
        Some(not_on_or_after),
    )))?;
    let verifier = AssertionVerifier::new(Arc::new(EchoSigner));

    let early = verifier.verify_at(&assertion, not_before.saturating_sub(Duration::from_secs(1)));
    assert!(matches!(early, Err(VerificationError::NotYetValid)));

    verifier.verify_at(&assertion, not_before)?;
    verifier.verify_at(&assertion, not_on_or_after.saturating_sub(Duration::from_secs(1)))?;

    let late = verifier.verify_at(&assertion, not_on_or_after);
    assert!(matches!(late, Err(VerificationError::Expired)));
    Ok(())
}

#[test]
fn tampered_content_fails_verification() -> Result<(), Box<dyn std::error::Error>> {
    let mut assertion = build_assertion(None)?;
    let Statement::Attribute(statement) = &mut assertion.statements[0];
    statement.attributes[0].values[0].value = "platinum".to_string();
    let verifier = AssertionVerifier::new(Arc::new(EchoSigner));
    let result = verifier.verify(&assertion);
    assert!(matches!(result, Err(VerificationError::BadSignature)));
    Ok(())
}

#[test]
fn missing_signature_fails_verification() -> Result<(), Box<dyn std::error::Error>> {
    let mut assertion = build_assertion(None)?;
    assertion.signature = None;
    let verifier = AssertionVerifier::new(Arc::new(EchoSigner));
    let result = verifier.verify(&assertion);
    assert!(matches!(result, Err(VerificationError::BadSignature)));
    Ok(())
}

#[test]
fn empty_issuer_fails_verification() -> Result<(), Box<dyn std::error::Error>> {
    let mut assertion = build_assertion(None)?;
    assertion.issuer = NameId::new("");
    let verifier = AssertionVerifier::new(Arc::new(EchoSigner));
    let result = verifier.verify(&assertion);
    assert!(matches!(result, Err(VerificationError::MissingIssuer)));
    Ok(())
}

#[test]
fn wire_round_trip_preserves_verifiability() -> Result<(), Box<dyn std::error::Error>> {
    let assertion = build_assertion(None)?;
    let bytes = assertion.to_json_bytes()?;
    let decoded = SignedAssertion::from_json_bytes(&bytes)?;
    assert_eq!(decoded, assertion);
    let verifier = AssertionVerifier::new(Arc::new(EchoSigner));
    verifier.verify(&decoded)?;
    Ok(())
}

proptest! {
    #[test]
    fn window_evaluation_matches_bounds(
        not_before in -1_000_000_000_i64..1_000_000_000,
        validity_ms in 1_i64..1_000_000_000,
        at in -2_000_000_000_i64..2_000_000_000,
    ) {
        let start = Timestamp::from_unix_millis(not_before);
        let end = Timestamp::from_unix_millis(not_before + validity_ms);
        let conditions = Conditions::window(Some(start), Some(end));
        let result = conditions.evaluate_at(Timestamp::from_unix_millis(at));
        if at < not_before {
            prop_assert_eq!(result, Err(WindowError::NotYetValid));
        } else if at >= not_before + validity_ms {
            prop_assert_eq!(result, Err(WindowError::Expired));
        } else {
            prop_assert_eq!(result, Ok(()));
        }
    }
}
