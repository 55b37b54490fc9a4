// crates/phoneflow-gateway/src/descriptors.rs
// ============================================================================
// Module: Resource Descriptors
// Description: Typed table binding each entity to its URL segment and stores.
// Purpose: Replace runtime name derivation with an explicit resource table.
// Dependencies: phoneflow-core, phoneflow-store-sqlite, serde
// ============================================================================

//! ## Overview
//! A [`ResourceDescriptor`] names one entity's URL segment, its fallback
//! store, and (optionally) its relational store. [`build_descriptors`] emits
//! one descriptor per entity from a static segment table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use phoneflow_core::EntityKind;
use phoneflow_core::InMemoryDatabase;
use phoneflow_core::SharedEntityStore;
use phoneflow_store_sqlite::SqliteDatabase;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// URL segment for each entity under `/api`.
pub const RESOURCE_SEGMENTS: [(EntityKind, &str); 6] = [
    (EntityKind::Usuarios, "usuarios"),
    (EntityKind::Empresas, "empresas"),
    (EntityKind::Planes, "planes"),
    (EntityKind::Proveedores, "proveedores"),
    (EntityKind::Lineas, "lineas"),
    (EntityKind::Asesores, "asesores"),
];

// ============================================================================
// SECTION: Backend Mode
// ============================================================================

/// Global backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Serve from relational stores where a descriptor has one.
    Relational,
    /// Serve every entity from the in-memory fallback.
    Fallback,
}

impl BackendMode {
    /// Returns the mode label reported by the health endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Fallback => "fallback",
        }
    }
}

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// One entity's URL segment and backing stores.
#[derive(Clone)]
pub struct ResourceDescriptor {
    /// Entity served.
    entity: EntityKind,
    /// URL segment under `/api`.
    segment: &'static str,
    /// Always-available in-memory store.
    fallback: SharedEntityStore,
    /// Relational store, when configured.
    relational: Option<SharedEntityStore>,
}

impl ResourceDescriptor {
    /// Creates a descriptor served only by its fallback store.
    #[must_use]
    pub const fn new(
        entity: EntityKind,
        segment: &'static str,
        fallback: SharedEntityStore,
    ) -> Self {
        Self {
            entity,
            segment,
            fallback,
            relational: None,
        }
    }

    /// Attaches a relational store.
    #[must_use]
    pub fn with_relational(mut self, relational: SharedEntityStore) -> Self {
        self.relational = Some(relational);
        self
    }

    /// Returns the entity served.
    #[must_use]
    pub const fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Returns the URL segment.
    #[must_use]
    pub const fn segment(&self) -> &'static str {
        self.segment
    }

    /// Returns the fallback store.
    #[must_use]
    pub const fn fallback(&self) -> &SharedEntityStore {
        &self.fallback
    }

    /// Returns the relational store, if any.
    #[must_use]
    pub const fn relational(&self) -> Option<&SharedEntityStore> {
        self.relational.as_ref()
    }
}

/// Builds one descriptor per entity over the given stores.
#[must_use]
pub fn build_descriptors(
    fallback: &Arc<InMemoryDatabase>,
    relational: Option<&SqliteDatabase>,
) -> Vec<ResourceDescriptor> {
    RESOURCE_SEGMENTS
        .into_iter()
        .map(|(entity, segment)| {
            let descriptor = ResourceDescriptor::new(
                entity,
                segment,
                SharedEntityStore::from_store(fallback.store(entity)),
            );
            match relational {
                Some(database) => {
                    descriptor.with_relational(SharedEntityStore::from_store(database.store(entity)))
                }
                None => descriptor,
            }
        })
        .collect()
}
