// crates/phoneflow-core/src/runtime/fixtures.rs
// ============================================================================
// Module: PhoneFlow Fixtures
// Description: Seed rows for the in-memory fallback store.
// Purpose: Give a database-less deployment a browsable inventory.
// Dependencies: serde_json, crate::core
// ============================================================================

//! ## Overview
//! Fixtures are inserted in order, so referenced rows (companies, providers,
//! plans, subscribers) come before the lines and advisors that point at
//! them. Ids therefore start at 1 per entity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::core::EntityKind;
use crate::core::FieldMap;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// One seed row for an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    /// Entity the row belongs to.
    pub entity: EntityKind,
    /// Caller-style field map, prepared like any create request.
    pub fields: FieldMap,
}

impl Fixture {
    /// Builds a fixture from a JSON object literal.
    #[must_use]
    pub fn new(entity: EntityKind, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => FieldMap::new(),
        };
        Self {
            entity,
            fields,
        }
    }
}

/// Returns the default inventory used to seed the fallback store.
#[must_use]
pub fn default_fixtures() -> Vec<Fixture> {
    vec![
        Fixture::new(
            EntityKind::Empresas,
            json!({
                "nombre": "TechCorp S.A.",
                "nit": "900123456-1",
                "direccion": "Calle 123 #45-67, Bogotá",
                "telefono": "6012345678",
            }),
        ),
        Fixture::new(
            EntityKind::Empresas,
            json!({
                "nombre": "DataSoft Ltda.",
                "nit": "800987654-2",
                "direccion": "Carrera 89 #12-34, Medellín",
                "telefono": "6049876543",
            }),
        ),
        Fixture::new(
            EntityKind::Proveedores,
            json!({
                "nombre": "Claro Colombia",
                "contacto": "Ana Rodríguez",
                "telefono": "6013456789",
            }),
        ),
        Fixture::new(
            EntityKind::Proveedores,
            json!({
                "nombre": "Movistar Colombia",
                "contacto": "Luis Martínez",
                "telefono": "6014567890",
            }),
        ),
        Fixture::new(
            EntityKind::Planes,
            json!({
                "nombre": "Plan Básico",
                "descripcion": "Plan con 5GB de datos y 300 minutos",
                "datos": "5GB",
                "llamadas": "300 minutos",
                "precio": 25000,
                "proveedor_id": 1,
            }),
        ),
        Fixture::new(
            EntityKind::Planes,
            json!({
                "nombre": "Plan Premium",
                "descripcion": "Plan con 20GB de datos y minutos ilimitados",
                "datos": "20GB",
                "llamadas": "Ilimitadas",
                "precio": 45000,
                "proveedor_id": 2,
            }),
        ),
        Fixture::new(
            EntityKind::Usuarios,
            json!({
                "nombre": "Juan Pérez",
                "email": "juan@email.com",
                "telefono": "3001234567",
                "empresa_id": 1,
            }),
        ),
        Fixture::new(
            EntityKind::Usuarios,
            json!({
                "nombre": "María García",
                "email": "maria@email.com",
                "telefono": "3009876543",
                "empresa_id": 2,
            }),
        ),
        Fixture::new(
            EntityKind::Lineas,
            json!({
                "numero": "3001234567",
                "usuario_id": 1,
                "empresa_id": 1,
                "plan_id": 1,
                "proveedor_id": 1,
                "estado": "activa",
                "fecha_activacion": "2024-01-15",
                "fecha_renovacion": "2025-01-15",
            }),
        ),
        Fixture::new(
            EntityKind::Lineas,
            json!({
                "numero": "3001234568",
                "usuario_id": 2,
                "empresa_id": 2,
                "plan_id": 2,
                "proveedor_id": 2,
                "estado": "activa",
                "fecha_activacion": "2024-02-01",
                "fecha_renovacion": "2025-02-01",
            }),
        ),
        Fixture::new(
            EntityKind::Asesores,
            json!({
                "proveedor_id": 1,
                "nombre": "Carlos Gómez",
                "puesto": "ventas",
                "correo": "carlos.gomez@claro.com.co",
                "telefono_movil": "3104567890",
            }),
        ),
        Fixture::new(
            EntityKind::Asesores,
            json!({
                "proveedor_id": 2,
                "nombre": "Laura Torres",
                "puesto": "post_ventas",
                "correo": "laura.torres@movistar.com.co",
                "telefono_fijo": "6015551234",
            }),
        ),
    ]
}
