// crates/assertion-server-signing/src/lib.rs
// ============================================================================
// Module: Assertion Server Signing
// Description: Ed25519 SigningService implementations.
// Purpose: Sign assertion canonical input at issuance and check detached
//          signatures at verification.
// Dependencies: assertion-server-core, ed25519-dalek, base64, rand, thiserror
// ============================================================================

//! ## Overview
//! This crate provides two [`SigningService`] implementations over ed25519:
//! [`Ed25519SigningService`] holds a private key and both signs and verifies;
//! [`Ed25519VerifyingService`] holds only a public key for relying parties
//! that verify received assertions without ever signing. Keys load from raw
//! 32-byte files or base64 text files. Signature bytes travel base64-encoded
//! inside a [`SignatureBlob`] labeled with the `ed25519` scheme.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use assertion_server_core::SignatureBlob;
use assertion_server_core::SigningError;
use assertion_server_core::SigningService;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Signature scheme label attached to produced blobs.
pub const ED25519_ALGORITHM: &str = "ed25519";

/// Raw ed25519 key length in bytes.
const KEY_BYTES: usize = 32;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Key loading errors.
///
/// # Invariants
/// - Messages never embed key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("unable to read key file: {0}")]
    Io(String),
    /// The key bytes are not a valid ed25519 key.
    #[error("invalid ed25519 key: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Signing Service
// ============================================================================

/// Ed25519 signing service holding a private key.
#[derive(Clone)]
pub struct Ed25519SigningService {
    /// Private signing key.
    key: SigningKey,
    /// Optional key identifier attached to produced signatures.
    key_id: Option<String>,
}

impl Ed25519SigningService {
    /// Generates a service with a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let seed: [u8; KEY_BYTES] = rand::random();
        Self {
            key: SigningKey::from_bytes(&seed),
            key_id: None,
        }
    }

    /// Creates a service from raw private key bytes.
    #[must_use]
    pub fn from_key_bytes(bytes: &[u8; KEY_BYTES]) -> Self {
        Self {
            key: SigningKey::from_bytes(bytes),
            key_id: None,
        }
    }

    /// Loads a service from a key file holding raw or base64 key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the file cannot be read or does not decode
    /// to a 32-byte ed25519 private key.
    pub fn from_key_file(path: &Path) -> Result<Self, KeyError> {
        let bytes = read_key_bytes(path)?;
        Ok(Self::from_key_bytes(&bytes))
    }

    /// Attaches a key identifier to produced signatures.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Returns the base64 encoding of the public verifying key.
    #[must_use]
    pub fn verifying_key_base64(&self) -> String {
        BASE64.encode(self.key.verifying_key().as_bytes())
    }

    /// Returns a verify-only service sharing this key's public half.
    #[must_use]
    pub fn verifying_service(&self) -> Ed25519VerifyingService {
        Ed25519VerifyingService {
            key: self.key.verifying_key(),
        }
    }
}

impl SigningService for Ed25519SigningService {
    fn sign(&self, canonical: &[u8]) -> Result<SignatureBlob, SigningError> {
        let signature = self.key.sign(canonical);
        Ok(SignatureBlob {
            algorithm: ED25519_ALGORITHM.to_string(),
            key_id: self.key_id.clone(),
            value: BASE64.encode(signature.to_bytes()),
        })
    }

    fn verify(&self, canonical: &[u8], signature: &SignatureBlob) -> Result<bool, SigningError> {
        verify_blob(&self.key.verifying_key(), canonical, signature)
    }
}

// ============================================================================
// SECTION: Verifying Service
// ============================================================================

/// Ed25519 verify-only service for relying parties.
#[derive(Clone)]
pub struct Ed25519VerifyingService {
    /// Public verifying key.
    key: VerifyingKey,
}

impl Ed25519VerifyingService {
    /// Creates a service from raw public key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Invalid`] when the bytes are not a valid ed25519
    /// public key.
    pub fn from_key_bytes(bytes: &[u8; KEY_BYTES]) -> Result<Self, KeyError> {
        let key = VerifyingKey::from_bytes(bytes)
            .map_err(|err| KeyError::Invalid(err.to_string()))?;
        Ok(Self {
            key,
        })
    }

    /// Loads a service from a key file holding raw or base64 key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the file cannot be read or does not decode
    /// to a 32-byte ed25519 public key.
    pub fn from_key_file(path: &Path) -> Result<Self, KeyError> {
        let bytes = read_key_bytes(path)?;
        Self::from_key_bytes(&bytes)
    }
}

impl SigningService for Ed25519VerifyingService {
    fn sign(&self, _canonical: &[u8]) -> Result<SignatureBlob, SigningError> {
        Err(SigningError::NoSigningKey)
    }

    fn verify(&self, canonical: &[u8], signature: &SignatureBlob) -> Result<bool, SigningError> {
        verify_blob(&self.key, canonical, signature)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Verifies a signature blob against canonical bytes.
///
/// A wrong scheme label or a well-formed mismatching signature is a clean
/// `false`; a blob whose bytes cannot be interpreted is an error.
fn verify_blob(
    key: &VerifyingKey,
    canonical: &[u8],
    blob: &SignatureBlob,
) -> Result<bool, SigningError> {
    if blob.algorithm != ED25519_ALGORITHM {
        return Ok(false);
    }
    let bytes = BASE64
        .decode(&blob.value)
        .map_err(|err| SigningError::Service(format!("invalid base64 signature: {err}")))?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|err| SigningError::Service(format!("invalid signature bytes: {err}")))?;
    Ok(key.verify_strict(canonical, &signature).is_ok())
}

/// Reads raw or base64 key bytes from a file.
fn read_key_bytes(path: &Path) -> Result<[u8; KEY_BYTES], KeyError> {
    let bytes = fs::read(path).map_err(|err| KeyError::Io(err.to_string()))?;
    let decoded = if bytes.len() == KEY_BYTES {
        bytes
    } else {
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| KeyError::Invalid("key file must be raw bytes or utf-8".to_string()))?;
        BASE64
            .decode(text.trim())
            .map_err(|err| KeyError::Invalid(format!("invalid base64 key: {err}")))?
    };
    decoded
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::Invalid(format!("key must be {KEY_BYTES} bytes")))
}
