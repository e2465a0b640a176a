// crates/assertion-server-store-sqlite/src/lib.rs
// ============================================================================
// Module: Assertion Server SQLite Store
// Description: Durable SQLite backend for the attribute authority.
// Purpose: Provide the AttributeStore and CredentialChecker implementations
//          used by standalone deployments.
// Dependencies: assertion-server-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate persists attribute definitions, attribute value records, and
//! account credentials in a single `SQLite` database. It implements both
//! [`assertion_server_core::AttributeStore`] and
//! [`assertion_server_core::CredentialChecker`], so one store handle serves
//! the authority's storage and authentication needs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
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
        reason = "Test-only output and panic-based assertions are permitted."
    )]
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteAttributeStore;
pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
