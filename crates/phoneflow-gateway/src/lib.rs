// crates/phoneflow-gateway/src/lib.rs
// ============================================================================
// Module: PhoneFlow Gateway Library
// Description: HTTP resource gateway for the PhoneFlow inventory.
// Purpose: Expose entity CRUD, renewal reports, and health over axum.
// Dependencies: axum, phoneflow-config, phoneflow-core, phoneflow-store-sqlite
// ============================================================================

//! ## Overview
//! The gateway maps `/api/{segment}` routes onto entity stores through a
//! typed descriptor table. A global backend mode chooses between the
//! relational store and the in-memory fallback; individual calls fall back
//! when the relational store is unreachable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod descriptors;
pub mod error;
pub mod registry;
pub mod routes;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use descriptors::BackendMode;
pub use descriptors::ResourceDescriptor;
pub use descriptors::build_descriptors;
pub use error::ApiError;
pub use error::ErrorPolicy;
pub use registry::RegistryError;
pub use registry::ResourceRegistry;
pub use routes::AppState;
pub use routes::router;
pub use server::GatewayServer;
pub use server::GatewayServerError;
pub use telemetry::init_tracing;
