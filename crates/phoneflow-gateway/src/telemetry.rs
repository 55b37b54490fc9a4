// crates/phoneflow-gateway/src/telemetry.rs
// ============================================================================
// Module: Gateway Telemetry
// Description: Global tracing subscriber installation.
// Purpose: Route gateway and CLI log events to stderr with level filtering.
// Dependencies: tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! Installs a registry with an [`EnvFilter`] and a fmt layer. `RUST_LOG`
//! takes precedence over the configured directive. The subscriber can only
//! be set once per process; later calls report [`TelemetryError::Install`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Telemetry setup errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// A global subscriber is already installed.
    #[error("tracing subscriber install failed: {0}")]
    Install(String),
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(filter: &str) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => {
            EnvFilter::try_new(filter).map_err(|err| TelemetryError::Filter(err.to_string()))?
        }
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
