// crates/phoneflow-core/src/core/record.rs
// ============================================================================
// Module: PhoneFlow Records
// Description: Stored record model with flat JSON serialization.
// Purpose: Give every backend one observable record shape.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! A [`Record`] is an id, a field map, and two timestamps. It serializes flat
//! (`{id, ...fields, created_at, updated_at}`) so HTTP clients see the same
//! shape regardless of backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::Serializer;
use serde::ser::Error as _;
use serde::ser::SerializeMap;
use serde_json::Map;
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::identifiers::RecordId;
use crate::core::time::format_timestamp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Arbitrary JSON field map keyed by column name.
pub type FieldMap = Map<String, Value>;

/// Stored record as returned by every store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// Column values plus join-enriched display fields.
    pub fields: FieldMap,
    /// Creation instant.
    pub created_at: OffsetDateTime,
    /// Last update instant.
    pub updated_at: OffsetDateTime,
}

impl Record {
    /// Returns a field value, if present.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns a field as text when it holds a string.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Returns a field as an integer when it holds one.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let created_at = format_timestamp(self.created_at).map_err(S::Error::custom)?;
        let updated_at = format_timestamp(self.updated_at).map_err(S::Error::custom)?;
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("created_at", &created_at)?;
        map.serialize_entry("updated_at", &updated_at)?;
        map.end()
    }
}
