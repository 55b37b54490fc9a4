// crates/phoneflow-core/src/interfaces/mod.rs
// ============================================================================
// Module: PhoneFlow Interfaces
// Description: Backend-agnostic persistence traits.
// Purpose: Define the contract every entity store implements.
// Dependencies: thiserror, crate::core
// ============================================================================

//! ## Overview
//! [`EntityStore`] is the persistence seam between the gateway and its
//! backends. Implementations own their records exclusively; the gateway only
//! decides which implementation serves a call. [`RecordSource`] is the
//! read-only view the dashboard aggregator consumes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::EntityKind;
use crate::core::PreparedFields;
use crate::core::Record;
use crate::core::RecordId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Entity store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Target record does not exist (or was soft-deleted).
    #[error("{entity} record {id} not found")]
    NotFound {
        /// Entity that was queried.
        entity: EntityKind,
        /// Missing identifier.
        id: RecordId,
    },
    /// A unique column already holds the supplied value.
    #[error("{entity} {field} already exists")]
    Duplicate {
        /// Entity that rejected the write.
        entity: EntityKind,
        /// Column whose value collided.
        field: String,
    },
    /// Backend cannot be reached right now.
    #[error("entity store unavailable: {0}")]
    Unavailable(String),
    /// Prepared fields targeted a different entity.
    #[error("fields prepared for {actual} sent to {expected} store")]
    EntityMismatch {
        /// Entity served by the store.
        expected: EntityKind,
        /// Entity the fields were prepared for.
        actual: EntityKind,
    },
    /// Store I/O error.
    #[error("entity store io error: {0}")]
    Io(String),
    /// Store data is corrupted.
    #[error("entity store corruption: {0}")]
    Corrupt(String),
    /// Store schema version is incompatible.
    #[error("entity store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("entity store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("entity store error: {0}")]
    Store(String),
}

impl StoreError {
    /// Returns true when the error signals an unreachable backend.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

// ============================================================================
// SECTION: Entity Store
// ============================================================================

/// Persistence operations for one entity.
pub trait EntityStore {
    /// Returns the entity served by this store.
    fn entity(&self) -> EntityKind;

    /// Lists live records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails; an empty table is not an error.
    fn list(&self) -> Result<Vec<Record>, StoreError>;

    /// Fetches one live record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent or soft-deleted.
    fn get(&self, id: RecordId) -> Result<Record, StoreError>;

    /// Creates a record and returns it with join-enriched fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or a unique column collides.
    fn create(&self, fields: PreparedFields) -> Result<Record, StoreError>;

    /// Merges the supplied fields into an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent or soft-deleted.
    fn update(&self, id: RecordId, fields: PreparedFields) -> Result<Record, StoreError>;

    /// Deletes a record according to the entity's delete policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent or already deleted.
    fn delete(&self, id: RecordId) -> Result<(), StoreError>;
}

/// Read-only access to live records across entities.
pub trait RecordSource {
    /// Lists live records for an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the underlying store fails.
    fn records(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError>;
}

/// Ensures prepared fields belong to the store's entity.
///
/// # Errors
///
/// Returns [`StoreError::EntityMismatch`] when the entities differ.
pub fn ensure_entity(expected: EntityKind, fields: &PreparedFields) -> Result<(), StoreError> {
    let actual = fields.entity();
    if actual == expected {
        return Ok(());
    }
    Err(StoreError::EntityMismatch {
        expected,
        actual,
    })
}
