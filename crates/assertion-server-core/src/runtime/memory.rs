// crates/assertion-server-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Attribute Store
// Description: Mutex-guarded AttributeStore for tests and embedding.
// Purpose: Provide a dependency-free store honoring the full contract.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The in-memory store keeps definitions and value records in vectors behind
//! one mutex, so every store method is atomic with respect to every other.
//! Cascade deletion of a definition and its values happens under a single
//! lock acquisition, matching the durable stores' single-transaction rule.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::AttributeDefinition;
use crate::core::AttributeValueRecord;
use crate::core::DefinitionKey;
use crate::interfaces::AttributeStore;
use crate::interfaces::StoreError;
use crate::interfaces::ValueQuery;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Contents guarded by the store mutex.
#[derive(Debug, Default)]
struct MemoryInner {
    /// Stored attribute definitions.
    definitions: Vec<AttributeDefinition>,
    /// Stored attribute value records.
    values: Vec<AttributeValueRecord>,
}

/// In-memory attribute store.
///
/// # Invariants
/// - All access is serialized through one mutex.
/// - Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeStore {
    /// Shared store contents.
    inner: Arc<Mutex<MemoryInner>>,
}

impl InMemoryAttributeStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store contents.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Store("attribute store mutex poisoned".to_string()))
    }
}

/// Returns whether a record matches a query shape.
fn matches(record: &AttributeValueRecord, query: &ValueQuery) -> bool {
    match query {
        ValueQuery::BySubject {
            subject,
        } => record.subject == *subject,
        ValueQuery::ByAttribute {
            soa,
            attribute_id,
            data_type,
        } => {
            record.soa == *soa
                && record.attribute_id == *attribute_id
                && record.data_type == *data_type
        }
        ValueQuery::BySubjectAttribute {
            subject,
            soa,
            attribute_id,
            data_type,
        } => {
            record.subject == *subject
                && record.soa == *soa
                && record.attribute_id == *attribute_id
                && record.data_type == *data_type
        }
    }
}

impl AttributeStore for InMemoryAttributeStore {
    fn find_definitions(&self, key: &DefinitionKey) -> Result<Vec<AttributeDefinition>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.definitions.iter().filter(|def| def.key() == *key).cloned().collect())
    }

    fn insert_definition(&self, definition: &AttributeDefinition) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.definitions.push(definition.clone());
        Ok(())
    }

    fn delete_definition(&self, key: &DefinitionKey) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.definitions.retain(|def| def.key() != *key);
        inner.values.retain(|record| record.definition_key() != *key);
        Ok(())
    }

    fn find_values(&self, query: &ValueQuery) -> Result<Vec<AttributeValueRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.values.iter().filter(|record| matches(record, query)).cloned().collect())
    }

    fn insert_value(&self, record: &AttributeValueRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.values.push(record.clone());
        Ok(())
    }

    fn update_value(&self, old: &AttributeValueRecord, new_value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        for record in &mut inner.values {
            if record == old {
                record.value = new_value.to_string();
            }
        }
        Ok(())
    }

    fn delete_value(&self, record: &AttributeValueRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.values.retain(|existing| existing != record);
        Ok(())
    }
}
