// crates/phoneflow-gateway/src/server.rs
// ============================================================================
// Module: Gateway Server
// Description: Backend selection and HTTP serving for the PhoneFlow API.
// Purpose: Turn a validated config into a running axum service.
// Dependencies: axum, phoneflow-config, phoneflow-core, phoneflow-store-sqlite, tokio, tracing
// ============================================================================

//! ## Overview
//! [`GatewayServer::from_config`] builds the fallback store (seeded unless
//! disabled), opens the relational store when `database.enabled` is set, and
//! assembles the resource registry. A relational store that fails to open is
//! logged and the gateway continues in fallback mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use phoneflow_config::PhoneflowConfig;
use phoneflow_core::Clock;
use phoneflow_core::InMemoryDatabase;
use phoneflow_core::SystemClock;
use phoneflow_core::default_fixtures;
use phoneflow_store_sqlite::SqliteDatabase;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::descriptors::BackendMode;
use crate::descriptors::build_descriptors;
use crate::error::ErrorPolicy;
use crate::registry::ResourceRegistry;
use crate::routes::AppState;
use crate::routes::router;

// ============================================================================
// SECTION: Gateway Server
// ============================================================================

/// Gateway server instance.
pub struct GatewayServer {
    /// Server configuration.
    config: PhoneflowConfig,
    /// Resource registry shared with handlers.
    registry: Arc<ResourceRegistry>,
    /// Clock for report dates and health timestamps.
    clock: Arc<dyn Clock>,
}

impl GatewayServer {
    /// Builds a gateway from configuration using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServerError`] when the config is invalid or the
    /// registry cannot be assembled.
    pub fn from_config(config: PhoneflowConfig) -> Result<Self, GatewayServerError> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Builds a gateway from configuration using the provided clock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServerError`] when the config is invalid or the
    /// registry cannot be assembled.
    pub fn from_config_with_clock(
        config: PhoneflowConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayServerError> {
        config.validate().map_err(|err| GatewayServerError::Config(err.to_string()))?;
        let fallback = Arc::new(InMemoryDatabase::with_clock(Arc::clone(&clock)));
        if config.fallback.seed {
            fallback
                .seed(&default_fixtures())
                .map_err(|err| GatewayServerError::Init(err.to_string()))?;
        }
        let relational = open_relational(&config, &clock);
        let mode =
            if relational.is_some() { BackendMode::Relational } else { BackendMode::Fallback };
        info!(backend_mode = mode.as_str(), "resource backend selected");
        let descriptors = build_descriptors(&fallback, relational.as_ref());
        let registry = ResourceRegistry::new(mode, descriptors)
            .map_err(|err| GatewayServerError::Init(err.to_string()))?;
        Ok(Self {
            config,
            registry: Arc::new(registry),
            clock,
        })
    }

    /// Returns the backend mode in effect.
    #[must_use]
    pub fn mode(&self) -> BackendMode {
        self.registry.mode()
    }

    /// Returns the configured router without binding a listener.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState::new(
            Arc::clone(&self.registry),
            ErrorPolicy::new(self.config.server.mode.exposes_details()),
            self.config.renewals.default_window_days,
            Arc::clone(&self.clock),
        );
        router(state, self.config.server.max_body_bytes)
    }

    /// Serves HTTP requests until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), GatewayServerError> {
        let addr: SocketAddr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| GatewayServerError::Config(err.to_string()))?;
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| GatewayServerError::Transport(format!("http bind failed: {err}")))?;
        info!(%addr, "phoneflow gateway listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| GatewayServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Opens the relational database when enabled, logging failures.
fn open_relational(config: &PhoneflowConfig, clock: &Arc<dyn Clock>) -> Option<SqliteDatabase> {
    let store_config = config.database.store_config()?;
    let path = store_config.path.display().to_string();
    match SqliteDatabase::open_with_clock(store_config, Arc::clone(clock)) {
        Ok(database) => {
            info!(path = %path, "relational store opened");
            Some(database)
        }
        Err(err) => {
            warn!(path = %path, error = %err, "relational store unavailable; using fallback store");
            None
        }
    }
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "shutdown signal listener failed");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway server errors.
#[derive(Debug, Error)]
pub enum GatewayServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
