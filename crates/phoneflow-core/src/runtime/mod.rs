// crates/phoneflow-core/src/runtime/mod.rs
// ============================================================================
// Module: PhoneFlow Runtime
// Description: Store implementations and reporting built on the interfaces.
// Purpose: Provide the fallback store, shared store handles, and dashboards.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime helpers wire the core types into working components: the
//! in-memory fallback store, its fixtures, a shared store wrapper, and the
//! dashboard aggregator.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dashboard;
pub mod fixtures;
pub mod memory;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dashboard::DashboardAggregator;
pub use dashboard::RenewalDigest;
pub use dashboard::RenewalEntry;
pub use dashboard::SummaryCounts;
pub use fixtures::Fixture;
pub use fixtures::default_fixtures;
pub use memory::InMemoryDatabase;
pub use memory::InMemoryEntityStore;
pub use store::SharedEntityStore;
