// crates/phoneflow-config/src/lib.rs
// ============================================================================
// Module: PhoneFlow Config Library
// Description: Configuration model, loading, and validation.
// Purpose: Single source of truth for phoneflow.toml semantics.
// Dependencies: phoneflow-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `phoneflow-config` defines the configuration model for the PhoneFlow
//! gateway. Files are size-limited and validated before use; a missing
//! default file falls back to built-in defaults.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
