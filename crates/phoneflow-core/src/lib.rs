// crates/phoneflow-core/src/lib.rs
// ============================================================================
// Module: PhoneFlow Core Library
// Description: Public API surface for the PhoneFlow inventory core.
// Purpose: Expose entity types, the store interface, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! PhoneFlow core models the inventory entities (lines, subscribers, companies,
//! providers, plans, and advisors), the persistence interface every backend
//! implements, and the reporting logic that classifies line renewals. It is
//! backend-agnostic: the relational adapter lives in `phoneflow-store-sqlite`
//! and the HTTP surface lives in `phoneflow-gateway`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::EntityStore;
pub use interfaces::RecordSource;
pub use interfaces::StoreError;
pub use runtime::DashboardAggregator;
pub use runtime::Fixture;
pub use runtime::InMemoryDatabase;
pub use runtime::InMemoryEntityStore;
pub use runtime::RenewalDigest;
pub use runtime::RenewalEntry;
pub use runtime::SharedEntityStore;
pub use runtime::SummaryCounts;
pub use runtime::default_fixtures;
