// crates/phoneflow-core/src/runtime/store.rs
// ============================================================================
// Module: PhoneFlow Shared Store
// Description: Clonable trait-object wrapper for entity stores.
// Purpose: Let descriptors hold heterogeneous backends behind one type.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`SharedEntityStore`] erases the concrete backend so the gateway can hold
//! relational and fallback stores side by side.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::EntityKind;
use crate::core::PreparedFields;
use crate::core::Record;
use crate::core::RecordId;
use crate::interfaces::EntityStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Shared entity store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedEntityStore {
    /// Inner store implementation.
    inner: Arc<dyn EntityStore + Send + Sync>,
}

impl SharedEntityStore {
    /// Wraps an entity store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl EntityStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn EntityStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl EntityStore for SharedEntityStore {
    fn entity(&self) -> EntityKind {
        self.inner.entity()
    }

    fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.inner.list()
    }

    fn get(&self, id: RecordId) -> Result<Record, StoreError> {
        self.inner.get(id)
    }

    fn create(&self, fields: PreparedFields) -> Result<Record, StoreError> {
        self.inner.create(fields)
    }

    fn update(&self, id: RecordId, fields: PreparedFields) -> Result<Record, StoreError> {
        self.inner.update(id, fields)
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }
}
