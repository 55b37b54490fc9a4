// crates/phoneflow-core/src/core/entity.rs
// ============================================================================
// Module: PhoneFlow Entity Catalog
// Description: Closed set of inventory entities and their display metadata.
// Purpose: Name every managed resource once, with a typed handle.
// Dependencies: serde, crate::core::schema
// ============================================================================

//! ## Overview
//! [`EntityKind`] enumerates the inventory resources. Each kind carries its
//! storage name (also the route segment), a Spanish display label used in
//! user-facing messages, and a static [`EntitySchema`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::schema;
use crate::core::schema::EntitySchema;

// ============================================================================
// SECTION: Entity Kind
// ============================================================================

/// Inventory entity managed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Line subscribers.
    Usuarios,
    /// Corporate clients.
    Empresas,
    /// Service plans.
    Planes,
    /// Carriers.
    Proveedores,
    /// Mobile phone lines.
    Lineas,
    /// Provider sales advisors.
    Asesores,
}

impl EntityKind {
    /// Every entity in registration order.
    pub const ALL: [Self; 6] = [
        Self::Usuarios,
        Self::Empresas,
        Self::Planes,
        Self::Proveedores,
        Self::Lineas,
        Self::Asesores,
    ];

    /// Returns the storage name, also used as the route segment.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Usuarios => "usuarios",
            Self::Empresas => "empresas",
            Self::Planes => "planes",
            Self::Proveedores => "proveedores",
            Self::Lineas => "lineas",
            Self::Asesores => "asesores",
        }
    }

    /// Returns the singular display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Usuarios => "Usuario",
            Self::Empresas => "Empresa",
            Self::Planes => "Plan",
            Self::Proveedores => "Proveedor",
            Self::Lineas => "Línea",
            Self::Asesores => "Asesor",
        }
    }

    /// Returns true when the label takes feminine agreement.
    const fn is_feminine(self) -> bool {
        matches!(self, Self::Empresas | Self::Lineas)
    }

    /// Returns the message used when a record of this entity is missing.
    #[must_use]
    pub fn not_found_message(self) -> String {
        let suffix = if self.is_feminine() { "encontrada" } else { "encontrado" };
        format!("{} no {suffix}", self.label())
    }

    /// Returns the confirmation message for a successful delete.
    #[must_use]
    pub fn deleted_message(self) -> String {
        let verb = if self.is_feminine() { "eliminada" } else { "eliminado" };
        format!("{} {verb} correctamente", self.label())
    }

    /// Returns the static schema for this entity.
    #[must_use]
    pub const fn schema(self) -> &'static EntitySchema {
        schema::schema_for(self)
    }

    /// Resolves an entity from its storage name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
