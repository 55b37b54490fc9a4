// crates/phoneflow-gateway/src/registry.rs
// ============================================================================
// Module: Resource Registry
// Description: Per-entity backend dispatch with single-call fallback.
// Purpose: Route every store call to the active backend for its entity.
// Dependencies: phoneflow-core, thiserror, tracing
// ============================================================================

//! ## Overview
//! The registry decides the active store once per descriptor when it is
//! built: the relational store when the mode is [`BackendMode::Relational`]
//! and the descriptor carries one, the fallback store otherwise. When the
//! relational store reports [`StoreError::Unavailable`], the same call is
//! repeated once on the descriptor's fallback store. The choice is not
//! sticky; the next call tries the relational store again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use phoneflow_core::EntityKind;
use phoneflow_core::EntityStore;
use phoneflow_core::PreparedFields;
use phoneflow_core::Record;
use phoneflow_core::RecordId;
use phoneflow_core::RecordSource;
use phoneflow_core::SharedEntityStore;
use phoneflow_core::StoreError;
use thiserror::Error;
use tracing::warn;

use crate::descriptors::BackendMode;
use crate::descriptors::ResourceDescriptor;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two descriptors serve the same entity.
    #[error("duplicate descriptor for {0}")]
    DuplicateEntity(EntityKind),
    /// Two descriptors share a URL segment.
    #[error("duplicate resource segment: {0}")]
    DuplicateSegment(String),
    /// A descriptor's store serves a different entity.
    #[error("descriptor for {expected} holds a {actual} store")]
    StoreMismatch {
        /// Entity named by the descriptor.
        expected: EntityKind,
        /// Entity served by the attached store.
        actual: EntityKind,
    },
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Descriptor plus its resolved backend.
struct RegistryEntry {
    /// Descriptor as supplied.
    descriptor: ResourceDescriptor,
    /// Relational store when it is the active backend.
    active_relational: Option<SharedEntityStore>,
}

/// Registry of resource descriptors keyed by entity.
pub struct ResourceRegistry {
    /// Global backend mode.
    mode: BackendMode,
    /// Entries keyed by entity.
    entries: BTreeMap<EntityKind, RegistryEntry>,
    /// Entities in descriptor order.
    order: Vec<EntityKind>,
}

impl ResourceRegistry {
    /// Builds a registry, resolving the active backend per descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when descriptors collide or carry stores for
    /// the wrong entity.
    pub fn new(
        mode: BackendMode,
        descriptors: Vec<ResourceDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut entries = BTreeMap::new();
        let mut order = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let entity = descriptor.entity();
            ensure_store_entity(entity, descriptor.fallback())?;
            if let Some(relational) = descriptor.relational() {
                ensure_store_entity(entity, relational)?;
            }
            if entries.contains_key(&entity) {
                return Err(RegistryError::DuplicateEntity(entity));
            }
            let segment = descriptor.segment();
            let segment_taken = entries
                .values()
                .any(|entry: &RegistryEntry| entry.descriptor.segment() == segment);
            if segment_taken {
                return Err(RegistryError::DuplicateSegment(segment.to_string()));
            }
            let active_relational = match mode {
                BackendMode::Relational => descriptor.relational().cloned(),
                BackendMode::Fallback => None,
            };
            entries.insert(
                entity,
                RegistryEntry {
                    descriptor,
                    active_relational,
                },
            );
            order.push(entity);
        }
        Ok(Self {
            mode,
            entries,
            order,
        })
    }

    /// Returns the global backend mode.
    #[must_use]
    pub const fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Returns the registered descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.order.iter().filter_map(|entity| self.entries.get(entity)).map(|entry| &entry.descriptor)
    }

    /// Returns the URL segment for an entity.
    #[must_use]
    pub fn segment(&self, entity: EntityKind) -> Option<&'static str> {
        self.entries.get(&entity).map(|entry| entry.descriptor.segment())
    }

    /// Returns true when the entity is currently served relationally.
    #[must_use]
    pub fn is_relational(&self, entity: EntityKind) -> bool {
        self.entries.get(&entity).is_some_and(|entry| entry.active_relational.is_some())
    }

    /// Lists live records for an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when no descriptor is registered or both
    /// backends fail.
    pub fn list(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError> {
        self.dispatch(entity, "list", |store| store.list())
    }

    /// Fetches one live record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record is absent.
    pub fn get(&self, entity: EntityKind, id: RecordId) -> Result<Record, StoreError> {
        self.dispatch(entity, "get", |store| store.get(id))
    }

    /// Creates a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    pub fn create(&self, entity: EntityKind, fields: PreparedFields) -> Result<Record, StoreError> {
        self.dispatch(entity, "create", |store| store.create(fields.clone()))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record is absent.
    pub fn update(
        &self,
        entity: EntityKind,
        id: RecordId,
        fields: PreparedFields,
    ) -> Result<Record, StoreError> {
        self.dispatch(entity, "update", |store| store.update(id, fields.clone()))
    }

    /// Deletes a record per its entity's policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record is absent.
    pub fn delete(&self, entity: EntityKind, id: RecordId) -> Result<(), StoreError> {
        self.dispatch(entity, "delete", |store| store.delete(id))
    }

    /// Lists `child` records whose foreign key points at `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the parent is absent and
    /// [`StoreError::Invalid`] when `child` has no key referencing `parent`.
    pub fn children(
        &self,
        parent: EntityKind,
        parent_id: RecordId,
        child: EntityKind,
    ) -> Result<Vec<Record>, StoreError> {
        let foreign_key = child
            .schema()
            .joins
            .iter()
            .find(|join| join.target == parent)
            .map(|join| join.foreign_key)
            .ok_or_else(|| {
                StoreError::Invalid(format!("{child} has no reference to {parent}"))
            })?;
        self.get(parent, parent_id)?;
        let records = self.list(child)?;
        Ok(records
            .into_iter()
            .filter(|record| record.integer(foreign_key) == Some(parent_id.get()))
            .collect())
    }

    /// Runs `op` on the active store, repeating it on the fallback store
    /// when the relational backend is unavailable.
    fn dispatch<T, F>(&self, entity: EntityKind, operation: &str, op: F) -> Result<T, StoreError>
    where
        F: Fn(&SharedEntityStore) -> Result<T, StoreError>,
    {
        let entry = self
            .entries
            .get(&entity)
            .ok_or_else(|| StoreError::Store(format!("no resource registered for {entity}")))?;
        let Some(relational) = &entry.active_relational else {
            return op(entry.descriptor.fallback());
        };
        match op(relational) {
            Err(err) if err.is_unavailable() => {
                warn!(
                    entity = %entity,
                    operation,
                    error = %err,
                    "relational store unavailable; serving call from fallback store"
                );
                op(entry.descriptor.fallback())
            }
            result => result,
        }
    }
}

impl RecordSource for ResourceRegistry {
    fn records(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError> {
        self.list(entity)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures an attached store serves the descriptor's entity.
fn ensure_store_entity(
    expected: EntityKind,
    store: &SharedEntityStore,
) -> Result<(), RegistryError> {
    let actual = store.entity();
    if actual == expected {
        return Ok(());
    }
    Err(RegistryError::StoreMismatch {
        expected,
        actual,
    })
}
