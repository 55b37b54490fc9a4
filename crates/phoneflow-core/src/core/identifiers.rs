// crates/phoneflow-core/src/core/identifiers.rs
// ============================================================================
// Module: PhoneFlow Identifiers
// Description: Record identifier newtype.
// Purpose: Keep record ids strongly typed across stores and routes.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Record identifiers are positive integers assigned by the active store.
//! Route parameters are parsed through [`RecordId::parse`] so malformed ids
//! never reach a backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Record Id
// ============================================================================

/// Identifier for a stored record, unique within its entity.
///
/// # Invariants
/// - Values are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

/// Errors raised when parsing record identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIdError {
    /// Identifier was not an integer.
    #[error("record id must be an integer: {0}")]
    NotNumeric(String),
    /// Identifier was zero or negative.
    #[error("record id must be positive: {0}")]
    NotPositive(i64),
}

impl RecordId {
    /// Creates a record identifier from a raw integer.
    ///
    /// # Errors
    ///
    /// Returns [`RecordIdError::NotPositive`] when the value is zero or negative.
    pub const fn new(value: i64) -> Result<Self, RecordIdError> {
        if value <= 0 {
            return Err(RecordIdError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Parses a record identifier from a route segment.
    ///
    /// # Errors
    ///
    /// Returns [`RecordIdError`] when the text is not a positive integer.
    pub fn parse(raw: &str) -> Result<Self, RecordIdError> {
        let value =
            raw.trim().parse::<i64>().map_err(|_| RecordIdError::NotNumeric(raw.to_string()))?;
        Self::new(value)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
