// crates/phoneflow-gateway/tests/common/mod.rs
// =============================================================================
// Module: Gateway Test Helpers
// Description: Shared builders for gateway integration tests.
// Purpose: Spawn routers on loopback listeners and build test registries.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test helpers fail fast on setup errors."
)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use axum::Router;
use phoneflow_config::PhoneflowConfig;
use phoneflow_config::ServerMode;
use phoneflow_core::Clock;
use phoneflow_core::EntityKind;
use phoneflow_core::EntityStore;
use phoneflow_core::FixedClock;
use phoneflow_core::PreparedFields;
use phoneflow_core::Record;
use phoneflow_core::RecordId;
use phoneflow_core::StoreError;
use phoneflow_gateway::GatewayServer;
use serde_json::Value;
use time::macros::datetime;
use tokio::sync::oneshot;

/// Returns the clock shared by gateway tests (2026-05-01 12:00 UTC).
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::new(datetime!(2026-05-01 12:00:00 UTC)))
}

/// Returns a config serving from the fallback store.
pub fn fallback_config(seed: bool) -> PhoneflowConfig {
    let mut config = PhoneflowConfig::default();
    config.fallback.seed = seed;
    config
}

/// Returns a config serving from a relational store at `path`.
pub fn relational_config(path: &Path) -> PhoneflowConfig {
    let mut config = PhoneflowConfig::default();
    config.fallback.seed = false;
    config.database.enabled = true;
    config.database.path = Some(path.to_path_buf());
    config
}

/// Builds a gateway router from config with the fixed clock.
pub fn gateway_router(config: PhoneflowConfig) -> Router {
    GatewayServer::from_config_with_clock(config, fixed_clock()).expect("gateway").router()
}

/// Returns the config with production error disclosure.
pub fn production(mut config: PhoneflowConfig) -> PhoneflowConfig {
    config.server.mode = ServerMode::Production;
    config
}

/// Serves `app` on an ephemeral loopback port.
pub async fn spawn_router(app: Router) -> (String, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    (format!("http://{addr}"), shutdown_tx)
}

/// Issues a request and returns the status code and JSON body.
pub async fn call(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<&Value>,
) -> (u16, Value) {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await.expect("request");
    let status = response.status().as_u16();
    let text = response.text().await.expect("body");
    let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text).expect("json") };
    (status, value)
}

/// Entity store that fails every call with a fixed error.
pub struct FailingStore {
    /// Entity reported by the store.
    entity: EntityKind,
    /// Error returned from every operation.
    error: StoreError,
    /// Number of calls received.
    calls: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Creates a failing store and returns it with its call counter.
    pub fn new(entity: EntityKind, error: StoreError) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Self {
            entity,
            error,
            calls: Arc::clone(&calls),
        };
        (store, calls)
    }

    /// Records a call and returns the configured error.
    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

impl EntityStore for FailingStore {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.fail()
    }

    fn get(&self, _id: RecordId) -> Result<Record, StoreError> {
        self.fail()
    }

    fn create(&self, _fields: PreparedFields) -> Result<Record, StoreError> {
        self.fail()
    }

    fn update(&self, _id: RecordId, _fields: PreparedFields) -> Result<Record, StoreError> {
        self.fail()
    }

    fn delete(&self, _id: RecordId) -> Result<(), StoreError> {
        self.fail()
    }
}
