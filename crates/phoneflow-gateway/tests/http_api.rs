// crates/phoneflow-gateway/tests/http_api.rs
// =============================================================================
// Module: HTTP API Tests
// Description: End-to-end requests against a served gateway.
// Purpose: Validate status codes, bodies, and report endpoints over HTTP.
// =============================================================================

//! ## Overview
//! Serves the gateway on a loopback port and drives it with reqwest.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use phoneflow_gateway::BackendMode;
use phoneflow_gateway::GatewayServer;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tempfile::TempDir;

use crate::common::call;
use crate::common::fallback_config;
use crate::common::fixed_clock;
use crate::common::gateway_router;
use crate::common::production;
use crate::common::relational_config;
use crate::common::spawn_router;

// ============================================================================
// SECTION: Resource Lifecycle
// ============================================================================

/// Verifies the create, read, update, delete lifecycle of a company.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empresa_lifecycle_over_http() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(true))).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/empresas");

    let (status, seeded) = call(&client, Method::GET, &url, None).await;
    assert_eq!(status, 200);
    assert_eq!(seeded.as_array().expect("list").len(), 2);

    let payload = json!({"nombre": "Acme", "nit": "900", "id": 77, "created_at": "1999", "x": 1});
    let (status, created) = call(&client, Method::POST, &url, Some(&payload)).await;
    assert_eq!(status, 201);
    assert_eq!(created["id"], json!(3));
    assert_eq!(created["nombre"], json!("Acme"));
    assert_eq!(created["direccion"], serde_json::Value::Null);
    assert_eq!(created["created_at"], json!("2026-05-01T12:00:00Z"));
    assert!(created.get("x").is_none());

    let (status, fetched) = call(&client, Method::GET, &format!("{url}/3"), None).await;
    assert_eq!(status, 200);
    assert_eq!(fetched, created);

    let (status, updated) =
        call(&client, Method::PUT, &format!("{url}/3"), Some(&json!({"telefono": "601"}))).await;
    assert_eq!(status, 200);
    assert_eq!(updated["telefono"], json!("601"));
    assert_eq!(updated["nit"], json!("900"));

    let (status, blank) =
        call(&client, Method::PUT, &format!("{url}/3"), Some(&json!({"nombre": "  "}))).await;
    assert_eq!(status, 400);
    assert_eq!(blank, json!({"error": "Datos inválidos", "fields": ["nombre"]}));

    let (status, deleted) = call(&client, Method::DELETE, &format!("{url}/3"), None).await;
    assert_eq!(status, 200);
    assert_eq!(deleted, json!({"message": "Empresa eliminada correctamente"}));

    let (status, missing) = call(&client, Method::GET, &format!("{url}/3"), None).await;
    assert_eq!(status, 404);
    assert_eq!(missing, json!({"error": "Empresa no encontrada"}));
    let _ = shutdown.send(());
}

/// Verifies seeded data is joined and soft-deleted advisors disappear.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn seeded_fallback_serves_joined_records() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(true))).await;
    let client = reqwest::Client::new();

    let (status, lineas) = call(&client, Method::GET, &format!("{base}/api/lineas"), None).await;
    assert_eq!(status, 200);
    let first = &lineas.as_array().expect("list")[0];
    assert_eq!(first["numero"], json!("3001234568"));
    assert_eq!(first["usuario_nombre"], json!("María García"));
    assert_eq!(first["plan_nombre"], json!("Plan Premium"));
    assert_eq!(first["proveedor_nombre"], json!("Movistar Colombia"));
    assert_eq!(first["empresa_nombre"], json!("DataSoft Ltda."));

    let (status, _) = call(&client, Method::DELETE, &format!("{base}/api/asesores/1"), None).await;
    assert_eq!(status, 200);
    let (_, asesores) = call(&client, Method::GET, &format!("{base}/api/asesores"), None).await;
    let names: Vec<&str> = asesores
        .as_array()
        .expect("list")
        .iter()
        .map(|asesor| asesor["nombre"].as_str().expect("nombre"))
        .collect();
    assert_eq!(names, vec!["Laura Torres"]);
    let (status, _) = call(
        &client,
        Method::PUT,
        &format!("{base}/api/asesores/1"),
        Some(&json!({"nombre": "Revivido"})),
    )
    .await;
    assert_eq!(status, 404);

    let (status, children) =
        call(&client, Method::GET, &format!("{base}/api/proveedores/1/asesores"), None).await;
    assert_eq!(status, 200);
    assert_eq!(children, json!([]));
    let _ = shutdown.send(());
}

/// Verifies per-provider listings under both path shapes.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn provider_listings_answer_on_both_paths() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(true))).await;
    let client = reqwest::Client::new();

    let (status, asesores) =
        call(&client, Method::GET, &format!("{base}/api/asesores/proveedor/2"), None).await;
    assert_eq!(status, 200);
    let asesores = asesores.as_array().expect("list");
    assert_eq!(asesores.len(), 1);
    assert_eq!(asesores[0]["nombre"], json!("Laura Torres"));
    let (_, nested) =
        call(&client, Method::GET, &format!("{base}/api/proveedores/2/asesores"), None).await;
    assert_eq!(nested.as_array().expect("list"), asesores);

    let (status, lineas) =
        call(&client, Method::GET, &format!("{base}/api/lineas/proveedor/1"), None).await;
    assert_eq!(status, 200);
    let lineas = lineas.as_array().expect("list");
    assert_eq!(lineas.len(), 1);
    assert_eq!(lineas[0]["numero"], json!("3001234567"));

    let (status, missing) =
        call(&client, Method::GET, &format!("{base}/api/lineas/proveedor/99"), None).await;
    assert_eq!(status, 404);
    assert_eq!(missing, json!({"error": "Proveedor no encontrado"}));
    let _ = shutdown.send(());
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Verifies the renewal lookahead query is validated and defaulted.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn renewal_window_query_is_validated() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(true))).await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/lineas/renovaciones");

    for bad in ["-1", "abc", "2.5", "1&dias=2"] {
        let (status, body) = call(&client, Method::GET, &format!("{url}?dias={bad}"), None).await;
        assert_eq!(status, 400, "{bad}");
        assert_eq!(body, json!({"error": "Datos inválidos", "fields": ["dias"]}));
    }

    let (status, overdue) = call(&client, Method::GET, &url, None).await;
    assert_eq!(status, 200);
    let entries = overdue.as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["numero"], json!("3001234567"));
    assert_eq!(entries[0]["bucket"], json!("expired"));
    assert!(entries[0]["days_remaining"].as_i64().expect("days") < 0);

    let (status, wide) = call(&client, Method::GET, &format!("{url}?dias=99999"), None).await;
    assert_eq!(status, 200);
    assert_eq!(wide.as_array().expect("entries").len(), 2);
    let _ = shutdown.send(());
}

/// Verifies the digest counts match the widest lookahead split by bucket.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn renewal_digest_matches_widest_lookahead() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(false))).await;
    let client = reqwest::Client::new();
    let lines = [
        ("3000000001", "activa", "2026-04-20"),
        ("3000000002", "activa", "2026-05-05"),
        ("3000000003", "activa", "2026-05-08"),
        ("3000000004", "activa", "2026-05-20"),
        ("3000000005", "activa", "2026-05-31"),
        ("3000000006", "activa", "2026-06-01"),
        ("3000000007", "activa", "2031-01-01"),
        ("3000000008", "suspendida", "2026-05-02"),
    ];
    for (numero, estado, fecha) in lines {
        let payload = json!({"numero": numero, "estado": estado, "fecha_renovacion": fecha});
        let (status, _) =
            call(&client, Method::POST, &format!("{base}/api/lineas"), Some(&payload)).await;
        assert_eq!(status, 201, "{numero}");
    }

    let (status, digest) =
        call(&client, Method::GET, &format!("{base}/api/dashboard/renovaciones"), None).await;
    assert_eq!(status, 200);
    let (status, wide) =
        call(&client, Method::GET, &format!("{base}/api/lineas/renovaciones?dias=99999"), None)
            .await;
    assert_eq!(status, 200);
    let wide = wide.as_array().expect("entries");
    assert_eq!(wide.len(), 7);

    let count = |bucket: &str| wide.iter().filter(|entry| entry["bucket"] == json!(bucket)).count();
    assert_eq!(digest["expired"], json!(count("expired")));
    assert_eq!(digest["urgent"], json!(count("urgent")));
    assert_eq!(digest["upcoming"], json!(count("upcoming")));
    assert_eq!(
        digest["lines"].as_array().expect("lines").len(),
        wide.len() - count("normal"),
    );
    assert_eq!(digest["expired"], json!(1));
    assert_eq!(digest["urgent"], json!(2));
    assert_eq!(digest["upcoming"], json!(2));
    assert_eq!(count("normal"), 2);
    let _ = shutdown.send(());
}

/// Verifies dashboard totals over the seeded inventory.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dashboard_reports_seeded_inventory() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(true))).await;
    let client = reqwest::Client::new();

    let (status, stats) =
        call(&client, Method::GET, &format!("{base}/api/dashboard/stats"), None).await;
    assert_eq!(status, 200);
    assert_eq!(
        stats,
        json!({
            "usuarios": 2,
            "empresas": 2,
            "planes": 2,
            "proveedores": 2,
            "lineas": 2,
            "asesores": 2,
            "lineas_activas": 2,
            "lineas_inactivas": 0,
            "lineas_por_renovar": 0,
            "lineas_vencidas": 2,
        })
    );

    let (status, digest) =
        call(&client, Method::GET, &format!("{base}/api/dashboard/renovaciones"), None).await;
    assert_eq!(status, 200);
    assert_eq!(digest["expired"], json!(2));
    assert_eq!(digest["urgent"], json!(0));
    assert_eq!(digest["upcoming"], json!(0));
    assert_eq!(digest["lines"].as_array().expect("lines").len(), 2);
    let _ = shutdown.send(());
}

/// Verifies the advisor role catalog.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn advisor_roles_are_listed_with_labels() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(false))).await;
    let client = reqwest::Client::new();
    let (status, roles) =
        call(&client, Method::GET, &format!("{base}/api/asesores/puestos"), None).await;
    assert_eq!(status, 200);
    let roles = roles.as_array().expect("roles");
    assert_eq!(roles.len(), 5);
    assert_eq!(roles[0], json!({"value": "ventas", "label": "Ventas"}));
    assert_eq!(roles[2], json!({"value": "soporte", "label": "Soporte Técnico"}));
    let _ = shutdown.send(());
}

// ============================================================================
// SECTION: Health and Errors
// ============================================================================

/// Verifies health reports the backend mode selected at startup.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_reports_backend_mode() {
    let client = reqwest::Client::new();

    let (base, shutdown) = spawn_router(gateway_router(fallback_config(false))).await;
    let (status, health) = call(&client, Method::GET, &format!("{base}/api/health"), None).await;
    assert_eq!(status, 200);
    assert_eq!(
        health,
        json!({"status": "ok", "timestamp": "2026-05-01T12:00:00Z", "backend_mode": "fallback"})
    );
    let _ = shutdown.send(());

    let dir = TempDir::new().expect("tempdir");
    let (base, shutdown) =
        spawn_router(gateway_router(relational_config(&dir.path().join("db.sqlite")))).await;
    let (_, health) = call(&client, Method::GET, &format!("{base}/api/health"), None).await;
    assert_eq!(health["backend_mode"], json!("relational"));
    let _ = shutdown.send(());
}

/// Verifies a relational store that cannot open leaves the gateway in fallback mode.
#[test]
fn unopenable_database_selects_fallback_mode() {
    let dir = TempDir::new().expect("tempdir");
    let server = GatewayServer::from_config_with_clock(relational_config(dir.path()), fixed_clock())
        .expect("gateway");
    assert_eq!(server.mode(), BackendMode::Fallback);

    let mut invalid = fallback_config(false);
    invalid.server.bind = "not an address".to_string();
    assert!(GatewayServer::from_config_with_clock(invalid, fixed_clock()).is_err());
}

/// Verifies malformed bodies, unknown routes, and unknown ids.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_requests_use_error_contract() {
    let (base, shutdown) = spawn_router(gateway_router(production(fallback_config(true)))).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/empresas"))
        .header(CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body, json!({"error": "Datos inválidos", "fields": []}));

    let (status, body) =
        call(&client, Method::POST, &format!("{base}/api/empresas"), Some(&json!([1, 2]))).await;
    assert_eq!(status, 400);
    assert_eq!(body["fields"], json!([]));

    let (status, body) = call(&client, Method::GET, &format!("{base}/api/nada"), None).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Ruta no encontrada"}));

    for raw in ["abc", "0", "999"] {
        let (status, body) =
            call(&client, Method::GET, &format!("{base}/api/planes/{raw}"), None).await;
        assert_eq!(status, 404, "{raw}");
        assert_eq!(body, json!({"error": "Plan no encontrado"}));
    }

    let (status, body) =
        call(&client, Method::GET, &format!("{base}/api/empresas/9/lineas"), None).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Empresa no encontrada"}));
    let _ = shutdown.send(());
}

/// Verifies bodies above the configured limit are refused.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversized_bodies_are_refused() {
    let mut config = fallback_config(false);
    config.server.max_body_bytes = 1024;
    let (base, shutdown) = spawn_router(gateway_router(config)).await;
    let client = reqwest::Client::new();

    let payload = json!({"nombre": "x".repeat(4096)});
    let response =
        client.post(format!("{base}/api/empresas")).json(&payload).send().await.expect("request");
    assert_eq!(response.status().as_u16(), 413);
    let content_type = response.headers()[CONTENT_TYPE].to_str().expect("header").to_string();
    assert!(content_type.starts_with("application/json"), "{content_type}");
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body, json!({"error": "Cuerpo de solicitud demasiado grande"}));

    let (status, body) = call(
        &client,
        Method::PUT,
        &format!("{base}/api/empresas/1"),
        Some(&json!({"nombre": "y".repeat(4096)})),
    )
    .await;
    assert_eq!(status, 413);
    assert_eq!(body["error"], json!("Cuerpo de solicitud demasiado grande"));
    let _ = shutdown.send(());
}

/// Verifies unsupported methods on known routes answer with a JSON 405.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsupported_methods_use_error_contract() {
    let (base, shutdown) = spawn_router(gateway_router(fallback_config(true))).await;
    let client = reqwest::Client::new();
    for (method, path) in [
        (Method::PUT, "/api/lineas/renovaciones"),
        (Method::DELETE, "/api/empresas"),
        (Method::POST, "/api/health"),
        (Method::POST, "/api/asesores/proveedor/1"),
    ] {
        let (status, body) = call(&client, method.clone(), &format!("{base}{path}"), None).await;
        assert_eq!(status, 405, "{method} {path}");
        assert_eq!(body, json!({"error": "Método no permitido"}), "{method} {path}");
    }
    let _ = shutdown.send(());
}
