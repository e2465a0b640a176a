// crates/assertion-server-core/src/runtime/builder.rs
// ============================================================================
// Module: Assertion Builder
// Description: Assembles and signs assertion documents at issuance time.
// Purpose: Turn a validated query result into a signed assertion.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! The builder constructs an assertion exactly once: fresh identifier, issue
//! instant stamped at build time, caller inputs taken by value so later
//! mutation of caller state cannot reach the issued document, and a signature
//! requested over the canonical signing input. A signing failure aborts the
//! build; no assertion ever leaves the builder half-signed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::AssertionId;
use crate::core::CanonicalError;
use crate::core::Conditions;
use crate::core::NameId;
use crate::core::SignedAssertion;
use crate::core::Statement;
use crate::core::Subject;
use crate::core::Timestamp;
use crate::core::signing_input;
use crate::interfaces::SigningError;
use crate::interfaces::SigningService;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Assertion construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The signing input could not be encoded.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
    /// The signing service failed to produce a signature.
    #[error(transparent)]
    Signing(#[from] SigningError),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds signed assertions through an injected signing service.
#[derive(Clone)]
pub struct AssertionBuilder {
    /// Signing service producing detached signatures.
    signer: Arc<dyn SigningService>,
}

impl AssertionBuilder {
    /// Creates a builder around a signing service.
    #[must_use]
    pub fn new(signer: Arc<dyn SigningService>) -> Self {
        Self {
            signer,
        }
    }

    /// Builds a signed assertion from the given content.
    ///
    /// Generates a fresh identifier, stamps the current instant as the issue
    /// instant, and signs the canonical encoding of the content.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when canonical encoding or signing fails; no
    /// assertion is produced in that case.
    pub fn build(
        &self,
        issuer: NameId,
        subject: Option<Subject>,
        conditions: Option<Conditions>,
        statements: Vec<Statement>,
    ) -> Result<SignedAssertion, BuildError> {
        let mut assertion = SignedAssertion {
            id: AssertionId::generate(),
            issue_instant: Timestamp::now(),
            issuer,
            subject,
            conditions,
            statements,
            signature: None,
        };
        let input = signing_input(&assertion)?;
        let signature = self.signer.sign(&input)?;
        assertion.signature = Some(signature);
        Ok(assertion)
    }
}
