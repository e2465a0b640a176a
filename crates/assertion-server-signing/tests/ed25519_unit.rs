// crates/assertion-server-signing/tests/ed25519_unit.rs
// ============================================================================
// Module: Ed25519 Signing Tests
// Description: Validate signing and verification service behavior.
// Purpose: Ensure signatures round trip, tampering is detected, and key
//          loading accepts both raw and base64 key files.
// Dependencies: assertion-server-signing, assertion-server-core, tempfile
// ============================================================================

//! Signing service tests: round trips, tamper and key mismatch detection,
//! blob interpretation errors, and key file formats.

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

use std::fs;
use std::sync::Arc;

use assertion_server_core::AssertionBuilder;
use assertion_server_core::AssertionVerifier;
use assertion_server_core::Attribute;
use assertion_server_core::AttributeId;
use assertion_server_core::AttributeStatement;
use assertion_server_core::AttributeValue;
use assertion_server_core::NameId;
use assertion_server_core::SigningError;
use assertion_server_core::SigningService;
use assertion_server_core::Statement;
use assertion_server_core::Subject;
use assertion_server_signing::ED25519_ALGORITHM;
use assertion_server_signing::Ed25519SigningService;
use assertion_server_signing::Ed25519VerifyingService;
use assertion_server_signing::KeyError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tempfile::TempDir;

#[test]
fn sign_verify_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let service = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let blob = service.sign(b"canonical input")?;
    assert_eq!(blob.algorithm, ED25519_ALGORITHM);
    assert!(service.verify(b"canonical input", &blob)?);
    Ok(())
}

#[test]
fn tampered_input_fails() -> Result<(), Box<dyn std::error::Error>> {
    let service = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let blob = service.sign(b"canonical input")?;
    assert!(!service.verify(b"tampered input", &blob)?);
    Ok(())
}

#[test]
fn wrong_key_fails() -> Result<(), Box<dyn std::error::Error>> {
    let signer = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let other = Ed25519SigningService::from_key_bytes(&[9u8; 32]);
    let blob = signer.sign(b"canonical input")?;
    assert!(!other.verify(b"canonical input", &blob)?);
    Ok(())
}

#[test]
fn wrong_scheme_label_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let service = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let mut blob = service.sign(b"canonical input")?;
    blob.algorithm = "rsa-sha256".to_string();
    assert!(!service.verify(b"canonical input", &blob)?);
    Ok(())
}

#[test]
fn malformed_signature_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let service = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let mut blob = service.sign(b"canonical input")?;
    blob.value = "not base64!".to_string();
    let result = service.verify(b"canonical input", &blob);
    assert!(matches!(result, Err(SigningError::Service(_))));
    Ok(())
}

#[test]
fn key_id_is_attached_to_blobs() -> Result<(), Box<dyn std::error::Error>> {
    let service = Ed25519SigningService::from_key_bytes(&[7u8; 32]).with_key_id("issuer-2026");
    let blob = service.sign(b"canonical input")?;
    assert_eq!(blob.key_id.as_deref(), Some("issuer-2026"));
    Ok(())
}

#[test]
fn verifying_service_cannot_sign() -> Result<(), Box<dyn std::error::Error>> {
    let signer = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let verifier = signer.verifying_service();
    let blob = signer.sign(b"canonical input")?;
    assert!(verifier.verify(b"canonical input", &blob)?);
    let result = verifier.sign(b"canonical input");
    assert!(matches!(result, Err(SigningError::NoSigningKey)));
    Ok(())
}

#[test]
fn raw_key_file_loads() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("signing.key");
    fs::write(&path, [7u8; 32])?;
    let service = Ed25519SigningService::from_key_file(&path)?;
    let blob = service.sign(b"canonical input")?;
    assert!(service.verify(b"canonical input", &blob)?);
    Ok(())
}

#[test]
fn base64_key_file_loads() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("signing.key.b64");
    fs::write(&path, format!("{}\n", BASE64.encode([7u8; 32])))?;
    let from_base64 = Ed25519SigningService::from_key_file(&path)?;
    let from_raw = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    assert_eq!(from_base64.verifying_key_base64(), from_raw.verifying_key_base64());
    Ok(())
}

#[test]
fn short_key_file_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("short.key");
    fs::write(&path, BASE64.encode([7u8; 16]))?;
    let result = Ed25519SigningService::from_key_file(&path);
    assert!(matches!(result, Err(KeyError::Invalid(_))));
    Ok(())
}

#[test]
fn issued_assertion_verifies_with_public_key_only() -> Result<(), Box<dyn std::error::Error>> {
    let signer = Ed25519SigningService::generate();
    let builder = AssertionBuilder::new(Arc::new(signer.clone()));
    let statement = Statement::Attribute(AttributeStatement {
        attributes: vec![Attribute::new(
            AttributeId::new("membership-level"),
            vec![AttributeValue::new("gold")],
        )],
    });
    let assertion = builder.build(
        NameId::new("soa.example.org"),
        Some(Subject::new(NameId::new("alice"))),
        None,
        vec![statement],
    )?;
    let verifier = AssertionVerifier::new(Arc::new(signer.verifying_service()));
    verifier.verify(&assertion)?;
    Ok(())
}

#[test]
fn verifying_service_loads_public_key_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let signer = Ed25519SigningService::from_key_bytes(&[7u8; 32]);
    let public = BASE64.decode(signer.verifying_key_base64())?;
    let bytes: [u8; 32] = public.as_slice().try_into()?;
    let verifier = Ed25519VerifyingService::from_key_bytes(&bytes)?;
    let blob = signer.sign(b"canonical input")?;
    assert!(verifier.verify(b"canonical input", &blob)?);
    Ok(())
}
