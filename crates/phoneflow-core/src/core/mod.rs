// crates/phoneflow-core/src/core/mod.rs
// ============================================================================
// Module: PhoneFlow Core Types
// Description: Entity catalog, record model, schema preparation, and renewals.
// Purpose: Group the data types shared by every store and the gateway.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types are plain data plus pure functions. Nothing in this module
//! performs I/O; stores and the gateway build on these definitions.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod entity;
pub mod identifiers;
pub mod record;
pub mod renewal;
pub mod schema;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entity::EntityKind;
pub use identifiers::RecordId;
pub use identifiers::RecordIdError;
pub use record::FieldMap;
pub use record::Record;
pub use renewal::RenewalBucket;
pub use renewal::RenewalWindow;
pub use renewal::UPCOMING_WINDOW_DAYS;
pub use renewal::URGENT_WINDOW_DAYS;
pub use renewal::classify;
pub use schema::ColumnDefault;
pub use schema::ColumnKind;
pub use schema::ColumnSpec;
pub use schema::DeletePolicy;
pub use schema::EntitySchema;
pub use schema::JoinSpec;
pub use schema::PreparedFields;
pub use schema::ValidationError;
pub use time::Clock;
pub use time::FixedClock;
pub use time::SystemClock;
