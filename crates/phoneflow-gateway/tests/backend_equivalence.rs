// crates/phoneflow-gateway/tests/backend_equivalence.rs
// =============================================================================
// Module: Backend Equivalence Tests
// Description: Replays one HTTP transcript against both backends.
// Purpose: Ensure the fallback and relational stores are observably identical.
// =============================================================================

//! ## Overview
//! Both backends start empty under the same fixed clock, so ids and
//! timestamps line up. Timestamps are still stripped before comparison so the
//! transcripts only differ when observable record content differs.

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

use reqwest::Method;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

use crate::common::call;
use crate::common::fallback_config;
use crate::common::gateway_router;
use crate::common::relational_config;
use crate::common::spawn_router;

// ============================================================================
// SECTION: Transcript
// ============================================================================

/// One scripted request.
struct Step {
    /// HTTP method.
    method: Method,
    /// Path below the base URL.
    path: &'static str,
    /// Optional JSON body.
    body: Option<Value>,
}

/// Shorthand for a step without a body.
fn step(method: Method, path: &'static str) -> Step {
    Step {
        method,
        path,
        body: None,
    }
}

/// Shorthand for a step with a JSON body.
fn step_with(method: Method, path: &'static str, body: Value) -> Step {
    Step {
        method,
        path,
        body: Some(body),
    }
}

/// Scripted session touching every resource and report.
fn script() -> Vec<Step> {
    vec![
        step_with(Method::POST, "/api/proveedores", json!({"nombre": "Claro", "telefono": "601"})),
        step_with(Method::POST, "/api/proveedores", json!({"nombre": "Tigo"})),
        step_with(Method::POST, "/api/empresas", json!({"nombre": "Acme", "nit": "900-1"})),
        step_with(
            Method::POST,
            "/api/planes",
            json!({"nombre": "Básico", "precio": "25000.5", "proveedor_id": 1}),
        ),
        step_with(Method::POST, "/api/usuarios", json!({"nombre": "Ana", "empresa_id": "1"})),
        step_with(
            Method::POST,
            "/api/lineas",
            json!({
                "numero": "3001234567",
                "usuario_id": 1,
                "empresa_id": 1,
                "plan_id": 1,
                "proveedor_id": 1,
                "fecha_renovacion": "2026-05-05"
            }),
        ),
        step_with(
            Method::POST,
            "/api/lineas",
            json!({"numero": "3001234568", "estado": "suspendida", "proveedor_id": 2}),
        ),
        step_with(Method::POST, "/api/lineas", json!({"numero": "3001234567"})),
        step_with(Method::POST, "/api/lineas", json!({"estado": "perdida"})),
        step_with(
            Method::POST,
            "/api/lineas",
            json!({"numero": "3009990000", "empresa_id": 1, "fecha_renovacion": "2026-04-20"}),
        ),
        step(Method::GET, "/api/lineas"),
        step_with(
            Method::PUT,
            "/api/lineas/2",
            json!({"estado": "activa", "fecha_renovacion": "2026-05-21"}),
        ),
        step_with(Method::PUT, "/api/lineas/2", json!({"numero": "3009990000"})),
        step(Method::GET, "/api/lineas/2"),
        step_with(
            Method::POST,
            "/api/asesores",
            json!({"proveedor_id": 1, "nombre": "Carla", "puesto": "soporte", "activo": false}),
        ),
        step_with(Method::POST, "/api/asesores", json!({"nombre": "Sin proveedor", "puesto": "ceo"})),
        step(Method::GET, "/api/proveedores/1/asesores"),
        step(Method::DELETE, "/api/asesores/1"),
        step(Method::DELETE, "/api/asesores/1"),
        step(Method::GET, "/api/asesores/1"),
        step(Method::GET, "/api/asesores"),
        step(Method::GET, "/api/empresas/1/lineas"),
        step(Method::GET, "/api/empresas/1/usuarios"),
        step(Method::GET, "/api/proveedores/1/planes"),
        step(Method::GET, "/api/proveedores/2/lineas"),
        step(Method::GET, "/api/empresas/99/usuarios"),
        step(Method::GET, "/api/dashboard/stats"),
        step(Method::GET, "/api/dashboard/renovaciones"),
        step(Method::GET, "/api/lineas/renovaciones?dias=10"),
        step(Method::GET, "/api/lineas/renovaciones"),
        step(Method::DELETE, "/api/empresas/1"),
        step(Method::DELETE, "/api/empresas/1"),
        step_with(Method::PUT, "/api/empresas/1", json!({"nombre": "Acme 2"})),
        step(Method::GET, "/api/usuarios/1"),
        step(Method::GET, "/api/lineas/1"),
        step(Method::GET, "/api/empresas/abc"),
        step(Method::GET, "/api/dashboard/stats"),
        step_with(Method::POST, "/api/usuarios", json!({"nombre": "Bea", "email": "bea@pf.co"})),
        step_with(Method::POST, "/api/usuarios", json!({"nombre": "Bea 2", "email": "bea@pf.co"})),
        step_with(Method::PUT, "/api/usuarios/1", json!({"email": "bea@pf.co"})),
        step(Method::GET, "/api/asesores/proveedor/1"),
        step(Method::GET, "/api/lineas/proveedor/2"),
        step(Method::GET, "/api/lineas/renovaciones?dias=99999"),
    ]
}

/// Recursively removes store-managed timestamps after checking their shape.
fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for field in ["created_at", "updated_at"] {
                if let Some(stamp) = map.remove(field) {
                    let text = stamp.as_str().expect("timestamp is a string");
                    assert!(text.ends_with('Z'), "timestamp {text} is not UTC");
                }
            }
            map.values_mut().for_each(normalize);
        }
        Value::Array(items) => items.iter_mut().for_each(normalize),
        _ => {}
    }
}

/// Runs the script against a served router and returns the normalized transcript.
async fn run_transcript(app: axum::Router) -> Vec<(String, u16, Value)> {
    let (base, shutdown) = spawn_router(app).await;
    let client = reqwest::Client::new();
    let mut transcript = Vec::new();
    for step in script() {
        let url = format!("{base}{}", step.path);
        let (status, mut body) = call(&client, step.method.clone(), &url, step.body.as_ref()).await;
        normalize(&mut body);
        transcript.push((format!("{} {}", step.method, step.path), status, body));
    }
    let _ = shutdown.send(());
    transcript
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies both backends produce the same transcript.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fallback_and_relational_transcripts_match() {
    let fallback = run_transcript(gateway_router(fallback_config(false))).await;

    let dir = TempDir::new().expect("tempdir");
    let relational =
        run_transcript(gateway_router(relational_config(&dir.path().join("phoneflow.sqlite"))))
            .await;

    assert_eq!(fallback.len(), relational.len());
    for (left, right) in fallback.iter().zip(relational.iter()) {
        assert_eq!(left, right, "backends diverged at {}", left.0);
    }
}

/// Verifies the expected statuses of the transcript on the fallback backend.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transcript_statuses_follow_api_contract() {
    let transcript = run_transcript(gateway_router(fallback_config(false))).await;
    let statuses: Vec<u16> = transcript.iter().map(|(_, status, _)| *status).collect();
    assert_eq!(
        statuses,
        vec![
            201, 201, 201, 201, 201, 201, 201, 400, 400, 201, 200, 200, 400, 200, 201, 400, 200,
            200, 404, 404, 200, 200, 200, 200, 200, 404, 200, 200, 200, 200, 200, 404, 404, 200,
            200, 404, 200, 201, 400, 400, 200, 200, 200,
        ]
    );
}

/// Verifies record content and report numbers along the transcript.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transcript_bodies_reflect_operations() {
    let dir = TempDir::new().expect("tempdir");
    let transcript =
        run_transcript(gateway_router(relational_config(&dir.path().join("phoneflow.sqlite"))))
            .await;
    let body = |index: usize| transcript[index].2.clone();

    let plan = body(3);
    assert_eq!(plan["precio"], json!(25000.5));
    assert_eq!(plan["proveedor_nombre"], json!("Claro"));

    let usuario = body(4);
    assert_eq!(usuario["empresa_id"], json!(1));
    assert_eq!(usuario["empresa_nombre"], json!("Acme"));

    let linea = body(5);
    assert_eq!(linea["id"], json!(1));
    assert_eq!(linea["estado"], json!("activa"));
    assert_eq!(linea["usuario_nombre"], json!("Ana"));
    assert_eq!(linea["plan_nombre"], json!("Básico"));

    assert_eq!(body(7), json!({"error": "Datos inválidos", "fields": ["numero"]}));
    assert_eq!(body(8), json!({"error": "Datos inválidos", "fields": ["estado", "numero"]}));

    let listed = body(10);
    let ids: Vec<i64> = listed
        .as_array()
        .expect("list")
        .iter()
        .map(|record| record["id"].as_i64().expect("id"))
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let updated = body(11);
    assert_eq!(updated["estado"], json!("activa"));
    assert_eq!(updated["numero"], json!("3001234568"));
    assert_eq!(updated["proveedor_nombre"], json!("Tigo"));
    assert_eq!(body(12), json!({"error": "Datos inválidos", "fields": ["numero"]}));

    let asesor = body(14);
    assert_eq!(asesor["activo"], json!(true));
    assert_eq!(body(15), json!({"error": "Datos inválidos", "fields": ["proveedor_id", "puesto"]}));
    assert_eq!(body(17), json!({"message": "Asesor eliminado correctamente"}));
    assert_eq!(body(18), json!({"error": "Asesor no encontrado"}));
    assert_eq!(body(20), json!([]));
    assert_eq!(body(25), json!({"error": "Empresa no encontrada"}));

    let stats = body(26);
    assert_eq!(stats["lineas"], json!(3));
    assert_eq!(stats["asesores"], json!(0));
    assert_eq!(stats["lineas_activas"], json!(3));
    assert_eq!(stats["lineas_inactivas"], json!(0));
    assert_eq!(stats["lineas_por_renovar"], json!(2));
    assert_eq!(stats["lineas_vencidas"], json!(1));

    let digest = body(27);
    assert_eq!(digest["expired"], json!(1));
    assert_eq!(digest["urgent"], json!(1));
    assert_eq!(digest["upcoming"], json!(1));
    let numbers: Vec<&str> = digest["lines"]
        .as_array()
        .expect("lines")
        .iter()
        .map(|entry| entry["numero"].as_str().expect("numero"))
        .collect();
    assert_eq!(numbers, vec!["3009990000", "3001234567", "3001234568"]);

    let within_ten = body(28);
    assert_eq!(within_ten.as_array().expect("entries").len(), 2);
    assert_eq!(within_ten[0]["days_remaining"], json!(-11));
    assert_eq!(within_ten[0]["bucket"], json!("expired"));
    assert_eq!(within_ten[1]["days_remaining"], json!(4));
    assert_eq!(body(29).as_array().expect("entries").len(), 3);

    assert_eq!(body(30), json!({"message": "Empresa eliminada correctamente"}));
    assert_eq!(body(32), json!({"error": "Empresa no encontrada"}));
    assert_eq!(body(33)["empresa_nombre"], Value::Null);
    assert_eq!(body(34)["empresa_id"], json!(1));
    assert_eq!(body(35), json!({"error": "Empresa no encontrada"}));

    let final_stats = body(36);
    assert_eq!(final_stats["empresas"], json!(0));
    assert_eq!(final_stats["usuarios"], json!(1));

    assert_eq!(body(37)["email"], json!("bea@pf.co"));
    assert_eq!(body(38), json!({"error": "Datos inválidos", "fields": ["email"]}));
    assert_eq!(body(39), json!({"error": "Datos inválidos", "fields": ["email"]}));
    assert_eq!(body(40), json!([]));
    assert_eq!(body(41).as_array().expect("list").len(), 1);
    assert_eq!(body(41)[0]["numero"], json!("3001234568"));
    assert_eq!(body(42).as_array().expect("entries").len(), 3);
}
