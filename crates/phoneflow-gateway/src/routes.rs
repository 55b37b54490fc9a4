// crates/phoneflow-gateway/src/routes.rs
// ============================================================================
// Module: Gateway Routes
// Description: Axum router for resource, dashboard, and health endpoints.
// Purpose: Bind registry operations to the `/api` URL space.
// Dependencies: axum, phoneflow-config, phoneflow-core, serde, tokio
// ============================================================================

//! ## Overview
//! Resource routes are generated from the registry's descriptors, so every
//! registered entity gets the same five endpoints:
//!
//! - `GET /api/{segment}` and `POST /api/{segment}`
//! - `GET`, `PUT`, and `DELETE /api/{segment}/{id}`
//!
//! Report endpoints (`/api/dashboard/*`, `/api/lineas/renovaciones`), the
//! advisor role catalog, related listings, and `/api/health` are added on
//! top. Related listings are served as `/api/{parent}/{id}/{child}`, and
//! the per-provider listings also under `/api/{child}/proveedor/{id}`.
//! Store calls are synchronous and run through [`run_blocking`].
//!
//! A path id that is not a positive integer cannot name a record and is
//! answered with the entity's 404. Body, query, and method rejections raised
//! by axum are rendered through [`ApiError`] as well.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use phoneflow_core::Clock;
use phoneflow_core::DashboardAggregator;
use phoneflow_core::EntityKind;
use phoneflow_core::FieldMap;
use phoneflow_core::Record;
use phoneflow_core::RecordId;
use phoneflow_core::RenewalDigest;
use phoneflow_core::RenewalEntry;
use phoneflow_core::SummaryCounts;
use phoneflow_core::schema::ADVISOR_ROLES;
use phoneflow_core::time::format_timestamp;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::runtime::RuntimeFlavor;

use crate::error::ApiError;
use crate::error::ErrorPolicy;
use crate::registry::ResourceRegistry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Related listings as (parent, child) pairs.
pub const CHILD_RESOURCES: [(EntityKind, EntityKind); 5] = [
    (EntityKind::Empresas, EntityKind::Usuarios),
    (EntityKind::Empresas, EntityKind::Lineas),
    (EntityKind::Proveedores, EntityKind::Asesores),
    (EntityKind::Proveedores, EntityKind::Planes),
    (EntityKind::Proveedores, EntityKind::Lineas),
];

/// Children also listed under `/api/{child}/proveedor/{id}`.
pub const PROVIDER_LISTINGS: [EntityKind; 2] = [EntityKind::Asesores, EntityKind::Lineas];

/// Display labels for advisor roles.
pub const ADVISOR_ROLE_LABELS: [(&str, &str); 5] = [
    ("ventas", "Ventas"),
    ("post_ventas", "Post-Ventas"),
    ("soporte", "Soporte Técnico"),
    ("gerencia", "Gerencia"),
    ("otro", "Otro"),
];

/// Path word naming the provider in per-provider listings.
const PROVIDER_PATH_WORD: &str = "proveedor";

/// Query field carrying the renewal lookahead.
const WINDOW_QUERY_FIELD: &str = "dias";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Resource registry.
    registry: Arc<ResourceRegistry>,
    /// Error disclosure policy.
    policy: ErrorPolicy,
    /// Lookahead used when `dias` is omitted.
    default_window_days: u32,
    /// Clock for "today" and health timestamps.
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub fn new(
        registry: Arc<ResourceRegistry>,
        policy: ErrorPolicy,
        default_window_days: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            policy,
            default_window_days,
            clock,
        }
    }

    /// Returns the resource registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }
}

/// Builds the full API router.
#[must_use]
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let resources: Vec<(EntityKind, &'static str)> = state
        .registry
        .descriptors()
        .map(|descriptor| (descriptor.entity(), descriptor.segment()))
        .collect();

    let mut router = Router::new()
        .route("/api/health", get(health))
        .route("/api/dashboard/stats", get(dashboard_stats))
        .route("/api/dashboard/renovaciones", get(dashboard_renewals))
        .route("/api/lineas/renovaciones", get(upcoming_renewals))
        .route("/api/asesores/puestos", get(advisor_roles));

    for (entity, segment) in resources {
        router = router
            .route(
                &format!("/api/{segment}"),
                get(move |State(state): State<AppState>| list_records(state, entity)).post(
                    move |State(state): State<AppState>, body: Result<Bytes, BytesRejection>| {
                        create_record(state, entity, body)
                    },
                ),
            )
            .route(
                &format!("/api/{segment}/{{id}}"),
                get(move |State(state): State<AppState>, Path(id): Path<String>| {
                    get_record(state, entity, id)
                })
                .put(
                    move |State(state): State<AppState>,
                          Path(id): Path<String>,
                          body: Result<Bytes, BytesRejection>| {
                        update_record(state, entity, id, body)
                    },
                )
                .delete(move |State(state): State<AppState>, Path(id): Path<String>| {
                    delete_record(state, entity, id)
                }),
            );
    }

    for (parent, child) in CHILD_RESOURCES {
        let (Some(parent_segment), Some(child_segment)) =
            (state.registry.segment(parent), state.registry.segment(child))
        else {
            continue;
        };
        router = router.route(
            &format!("/api/{parent_segment}/{{id}}/{child_segment}"),
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                child_records(state, parent, child, id)
            }),
        );
    }

    if state.registry.segment(EntityKind::Proveedores).is_some() {
        for child in PROVIDER_LISTINGS {
            let Some(child_segment) = state.registry.segment(child) else {
                continue;
            };
            router = router.route(
                &format!("/api/{child_segment}/{PROVIDER_PATH_WORD}/{{id}}"),
                get(move |State(state): State<AppState>, Path(id): Path<String>| {
                    child_records(state, EntityKind::Proveedores, child, id)
                }),
            );
        }
    }

    router
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================================
// SECTION: Resource Handlers
// ============================================================================

/// Lists live records.
async fn list_records(state: AppState, entity: EntityKind) -> Result<Json<Vec<Record>>, ApiError> {
    let records =
        run_blocking(|| state.registry.list(entity)).map_err(|err| state.policy.store(err))?;
    Ok(Json(records))
}

/// Fetches one record.
async fn get_record(
    state: AppState,
    entity: EntityKind,
    raw_id: String,
) -> Result<Json<Record>, ApiError> {
    let id = parse_id(entity, &raw_id)?;
    let record =
        run_blocking(|| state.registry.get(entity, id)).map_err(|err| state.policy.store(err))?;
    Ok(Json(record))
}

/// Creates a record from a JSON object body.
async fn create_record(
    state: AppState,
    entity: EntityKind,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let input = parse_body(&read_body(body)?)?;
    let prepared = entity.schema().prepare_create(&input)?;
    let record = run_blocking(|| state.registry.create(entity, prepared))
        .map_err(|err| state.policy.store(err))?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

/// Applies a partial update from a JSON object body.
async fn update_record(
    state: AppState,
    entity: EntityKind,
    raw_id: String,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Record>, ApiError> {
    let id = parse_id(entity, &raw_id)?;
    let input = parse_body(&read_body(body)?)?;
    let prepared = entity.schema().prepare_update(&input)?;
    let record = run_blocking(|| state.registry.update(entity, id, prepared))
        .map_err(|err| state.policy.store(err))?;
    Ok(Json(record))
}

/// Deletes a record.
async fn delete_record(
    state: AppState,
    entity: EntityKind,
    raw_id: String,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(entity, &raw_id)?;
    run_blocking(|| state.registry.delete(entity, id)).map_err(|err| state.policy.store(err))?;
    Ok(Json(json!({ "message": entity.deleted_message() })))
}

/// Lists child records referencing a parent.
async fn child_records(
    state: AppState,
    parent: EntityKind,
    child: EntityKind,
    raw_id: String,
) -> Result<Json<Vec<Record>>, ApiError> {
    let id = parse_id(parent, &raw_id)?;
    let records = run_blocking(|| state.registry.children(parent, id, child))
        .map_err(|err| state.policy.store(err))?;
    Ok(Json(records))
}

// ============================================================================
// SECTION: Report Handlers
// ============================================================================

/// Query string for the renewal lookahead.
#[derive(Debug, Deserialize)]
struct RenewalQuery {
    /// Lookahead in days.
    dias: Option<String>,
}

/// Returns entity totals and line splits.
async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<SummaryCounts>, ApiError> {
    let today = state.clock.today();
    let summary = run_blocking(|| DashboardAggregator::new(state.registry.as_ref()).summary(today))
        .map_err(|err| state.policy.internal(err))?;
    Ok(Json(summary))
}

/// Returns renewal bucket counts and the attention list.
async fn dashboard_renewals(
    State(state): State<AppState>,
) -> Result<Json<RenewalDigest>, ApiError> {
    let today = state.clock.today();
    let digest =
        run_blocking(|| DashboardAggregator::new(state.registry.as_ref()).renewal_digest(today))
            .map_err(|err| state.policy.internal(err))?;
    Ok(Json(digest))
}

/// Returns active lines renewing within the requested window.
async fn upcoming_renewals(
    State(state): State<AppState>,
    query: Result<Query<RenewalQuery>, QueryRejection>,
) -> Result<Json<Vec<RenewalEntry>>, ApiError> {
    let Ok(Query(query)) = query else {
        return Err(window_error());
    };
    let window = window_days(query.dias.as_deref(), state.default_window_days)?;
    let today = state.clock.today();
    let entries = run_blocking(|| {
        DashboardAggregator::new(state.registry.as_ref()).upcoming_renewals(today, window)
    })
    .map_err(|err| state.policy.internal(err))?;
    Ok(Json(entries))
}

/// One advisor role option.
#[derive(Debug, Serialize)]
struct RoleOption {
    /// Stored value.
    value: &'static str,
    /// Display label.
    label: &'static str,
}

/// Returns the advisor role catalog.
async fn advisor_roles() -> Json<Vec<RoleOption>> {
    let options = ADVISOR_ROLES
        .iter()
        .copied()
        .map(|role| RoleOption {
            value: role,
            label: role_label(role),
        })
        .collect();
    Json(options)
}

/// Returns service liveness and the backend mode.
async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let timestamp = format_timestamp(state.clock.now()).map_err(|err| state.policy.internal(err))?;
    Ok(Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "backend_mode": state.registry.mode().as_str(),
    })))
}

/// Answers unmatched routes.
async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Answers known routes requested with an unsupported method.
async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Executes a store call, shifting to a blocking context when available.
pub fn run_blocking<T>(call: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(call)
        }
        _ => call(),
    }
}

/// Parses a path id, treating malformed ids as absent records.
fn parse_id(entity: EntityKind, raw: &str) -> Result<RecordId, ApiError> {
    RecordId::parse(raw).map_err(|_| ApiError::NotFound {
        entity,
    })
}

/// Unwraps a buffered body, mapping the size limit to 413.
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation {
                fields: Vec::new(),
            }
        }
    })
}

/// Parses a request body that must be a JSON object.
fn parse_body(body: &Bytes) -> Result<FieldMap, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ApiError::Validation {
            fields: Vec::new(),
        }),
    }
}

/// Resolves the renewal lookahead from the raw query value.
///
/// Any non-negative integer is accepted; values past `u32::MAX` saturate.
fn window_days(raw: Option<&str>, default_days: u32) -> Result<u32, ApiError> {
    let Some(raw) = raw else {
        return Ok(default_days);
    };
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(window_error());
    }
    Ok(digits.parse::<u32>().unwrap_or(u32::MAX))
}

/// Validation failure for a malformed lookahead.
fn window_error() -> ApiError {
    ApiError::Validation {
        fields: vec![WINDOW_QUERY_FIELD.to_string()],
    }
}

/// Returns the display label for an advisor role.
fn role_label(role: &'static str) -> &'static str {
    ADVISOR_ROLE_LABELS
        .iter()
        .find(|(value, _)| *value == role)
        .map_or(role, |(_, label)| label)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
