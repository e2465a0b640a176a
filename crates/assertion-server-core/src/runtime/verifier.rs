// crates/assertion-server-core/src/runtime/verifier.rs
// ============================================================================
// Module: Assertion Verifier
// Description: Validity-window and signature verification for assertions.
// Purpose: Gate relying-party acceptance of received assertions.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Verification short-circuits on the first failure in the order: document
//! shape, validity window, signature. A malformed or expired assertion never
//! pays for a signature check. The cryptographic decision itself is delegated
//! to the injected signing service.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::SignedAssertion;
use crate::core::Timestamp;
use crate::core::WindowError;
use crate::core::signing_input;
use crate::interfaces::SigningService;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Assertion verification errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling by relying parties.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The assertion carries no usable issuer.
    #[error("assertion issuer is missing")]
    MissingIssuer,
    /// The evaluation instant precedes the validity window.
    #[error("assertion not yet valid")]
    NotYetValid,
    /// The evaluation instant is on or after the window end.
    #[error("assertion has expired")]
    Expired,
    /// The signature is absent or does not match the content.
    #[error("assertion signature is missing or invalid")]
    BadSignature,
    /// The canonical signing input could not be derived.
    #[error("assertion canonicalization failed: {0}")]
    Canonical(String),
    /// The signing service failed to evaluate the signature.
    #[error("signature verification failed: {0}")]
    Signing(String),
}

impl From<WindowError> for VerificationError {
    fn from(error: WindowError) -> Self {
        match error {
            WindowError::NotYetValid => Self::NotYetValid,
            WindowError::Expired => Self::Expired,
        }
    }
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Verifies received assertions against a signing service.
#[derive(Clone)]
pub struct AssertionVerifier {
    /// Signing service checking detached signatures.
    signer: Arc<dyn SigningService>,
}

impl AssertionVerifier {
    /// Creates a verifier around a signing service.
    #[must_use]
    pub fn new(signer: Arc<dyn SigningService>) -> Self {
        Self {
            signer,
        }
    }

    /// Verifies an assertion against the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when any check fails; see
    /// [`Self::verify_at`].
    pub fn verify(&self, assertion: &SignedAssertion) -> Result<(), VerificationError> {
        self.verify_at(assertion, Timestamp::now())
    }

    /// Verifies an assertion against an explicit instant.
    ///
    /// Checks run in order: issuer presence, validity window, signature.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::MissingIssuer`] for an empty issuer
    /// name, [`VerificationError::NotYetValid`] or
    /// [`VerificationError::Expired`] for window violations, and
    /// [`VerificationError::BadSignature`] when the signature is absent or
    /// does not verify.
    pub fn verify_at(
        &self,
        assertion: &SignedAssertion,
        at: Timestamp,
    ) -> Result<(), VerificationError> {
        if assertion.issuer.name.is_empty() {
            return Err(VerificationError::MissingIssuer);
        }
        if let Some(conditions) = &assertion.conditions {
            conditions.evaluate_at(at)?;
        }
        let input = signing_input(assertion)
            .map_err(|err| VerificationError::Canonical(err.to_string()))?;
        let Some(signature) = &assertion.signature else {
            return Err(VerificationError::BadSignature);
        };
        let valid = self
            .signer
            .verify(&input, signature)
            .map_err(|err| VerificationError::Signing(err.to_string()))?;
        if !valid {
            return Err(VerificationError::BadSignature);
        }
        Ok(())
    }
}
