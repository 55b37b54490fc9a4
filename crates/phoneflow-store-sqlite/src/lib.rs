// crates/phoneflow-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Entity Store
// Description: Relational EntityStore backend using SQLite.
// Purpose: Persist inventory records across restarts.
// Dependencies: phoneflow-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`phoneflow_core::EntityStore`] for
//! every inventory entity. One [`SqliteDatabase`] owns the connection; each
//! entity gets a lightweight [`SqliteEntityStore`] handle. Reads join display
//! names from related tables, matching the in-memory fallback store field for
//! field.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod sql;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteDatabase;
pub use store::SqliteEntityStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
