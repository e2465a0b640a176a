// crates/assertion-server-core/src/runtime/mod.rs
// ============================================================================
// Module: Assertion Server Runtime
// Description: Authority orchestration, assertion construction, verification,
//              and the in-memory store.
// Purpose: Re-export the runtime entry points from one namespace.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime wires the model and interfaces into behavior: the
//! [`AttributeAuthority`] orchestrates permission-checked operations, the
//! [`AssertionBuilder`] issues signed assertions, the [`AssertionVerifier`]
//! gates acceptance of received ones, and the [`InMemoryAttributeStore`]
//! backs tests and small embeddings.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod authority;
pub mod builder;
pub mod memory;
pub mod verifier;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use authority::AttributeAuthority;
pub use authority::AuthorityConfig;
pub use authority::AuthorityError;
pub use authority::AuthoritySession;
pub use authority::RequestResult;
pub use builder::AssertionBuilder;
pub use builder::BuildError;
pub use memory::InMemoryAttributeStore;
pub use verifier::AssertionVerifier;
pub use verifier::VerificationError;
