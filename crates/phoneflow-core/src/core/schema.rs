// crates/phoneflow-core/src/core/schema.rs
// ============================================================================
// Module: PhoneFlow Entity Schemas
// Description: Static column, join, and delete-policy tables per entity.
// Purpose: Validate and normalize caller fields before any store sees them.
// Dependencies: serde_json, thiserror, crate::core::{entity, time}
// ============================================================================

//! ## Overview
//! Every entity owns a static [`EntitySchema`]. Caller-supplied field maps are
//! turned into [`PreparedFields`] through [`EntitySchema::prepare_create`] or
//! [`EntitySchema::prepare_update`]; stores only accept prepared fields, so
//! both backends persist identical, already-coerced values.
//!
//! Preparation drops unknown and reserved keys, coerces each value by column
//! kind, applies defaults, and reports every violated field at once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use crate::core::entity::EntityKind;
use crate::core::record::FieldMap;
use crate::core::time::format_date;
use crate::core::time::parse_date;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Column on join targets that provides the display value.
pub const DISPLAY_COLUMN: &str = "nombre";

/// Line states accepted by the `estado` column.
pub const LINE_STATES: &[&str] = &["activa", "suspendida", "cancelada"];

/// Line state counted as active for reporting.
pub const ACTIVE_LINE_STATE: &str = "activa";

/// Advisor roles accepted by the `puesto` column.
pub const ADVISOR_ROLES: &[&str] = &["ventas", "post_ventas", "soporte", "gerencia", "otro"];

// ============================================================================
// SECTION: Column Model
// ============================================================================

/// Storage kind for a column, driving coercion and SQL affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text.
    Text,
    /// Signed 64-bit integer (foreign keys, counters).
    Integer,
    /// Decimal amount stored as a float.
    Decimal,
    /// Calendar date formatted `YYYY-MM-DD`.
    Date,
    /// Boolean flag.
    Bool,
    /// Text restricted to a fixed set of values.
    Enumerated(&'static [&'static str]),
}

impl ColumnKind {
    /// Returns the SQL type used when declaring this column.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Bool => "INTEGER",
            Self::Decimal => "REAL",
            Self::Text | Self::Date | Self::Enumerated(_) => "TEXT",
        }
    }

    /// Coerces a JSON value into the canonical representation for this kind.
    ///
    /// Returns `None` when the value cannot represent this kind.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match self {
            Self::Text => match value {
                Value::String(text) => Some(Value::String(text.clone())),
                Value::Number(number) => Some(Value::String(number.to_string())),
                Value::Bool(flag) => Some(Value::String(flag.to_string())),
                _ => None,
            },
            Self::Integer => match value {
                Value::Number(number) => number.as_i64().map(Value::from),
                Value::String(text) if text.trim().is_empty() => Some(Value::Null),
                Value::String(text) => text.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            },
            Self::Decimal => {
                let amount = match value {
                    Value::Number(number) => number.as_f64(),
                    Value::String(text) if text.trim().is_empty() => return Some(Value::Null),
                    Value::String(text) => text.trim().parse::<f64>().ok(),
                    _ => None,
                }?;
                amount.is_finite().then(|| Value::from(amount))
            }
            Self::Date => match value {
                Value::String(text) if text.trim().is_empty() => Some(Value::Null),
                Value::String(text) => {
                    let date = parse_date(text)?;
                    format_date(date).ok().map(Value::String)
                }
                _ => None,
            },
            Self::Bool => match value {
                Value::Bool(flag) => Some(Value::Bool(*flag)),
                Value::Number(number) => match number.as_i64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
                Value::String(text) => match text.trim() {
                    "true" | "1" => Some(Value::Bool(true)),
                    "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            Self::Enumerated(options) => match value {
                Value::String(text) if text.trim().is_empty() => Some(Value::Null),
                Value::String(text) => {
                    let text = text.trim();
                    options.contains(&text).then(|| Value::String(text.to_string()))
                }
                _ => None,
            },
        }
    }
}

/// Default applied when a column is absent on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    /// Column defaults to null.
    Null,
    /// Column defaults to a fixed text value.
    Text(&'static str),
    /// Column defaults to a fixed boolean.
    Bool(bool),
}

impl ColumnDefault {
    /// Returns the default as a JSON value.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(text) => Value::String(text.to_string()),
            Self::Bool(flag) => Value::Bool(flag),
        }
    }
}

/// Declared column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name, identical in JSON and SQL.
    pub name: &'static str,
    /// Storage kind.
    pub kind: ColumnKind,
    /// Whether create requires a non-blank value.
    pub required: bool,
    /// Whether values must be unique among live records.
    pub unique: bool,
    /// Whether the column is owned by the store and ignored on input.
    pub managed: bool,
    /// Value used when the column is absent on create.
    pub default: ColumnDefault,
}

impl ColumnSpec {
    /// Declares an optional column of the given kind.
    #[must_use]
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            unique: false,
            managed: false,
            default: ColumnDefault::Null,
        }
    }

    /// Declares an optional text column.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    /// Declares an optional integer column.
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    /// Marks the column as required.
    #[must_use]
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Marks the column as unique among live records.
    #[must_use]
    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    /// Marks the column as store-managed.
    #[must_use]
    pub const fn managed(self) -> Self {
        Self {
            managed: true,
            ..self
        }
    }

    /// Sets the create-time default.
    #[must_use]
    pub const fn with_default(self, default: ColumnDefault) -> Self {
        Self {
            default,
            ..self
        }
    }
}

/// Read-time join that adds a display name from another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    /// Integer column holding the target id.
    pub foreign_key: &'static str,
    /// Entity referenced by the foreign key.
    pub target: EntityKind,
    /// Output field carrying the target's display name.
    pub alias: &'static str,
}

/// Per-entity delete policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Rows are physically removed.
    Hard,
    /// Rows are flagged inactive and hidden from reads.
    Soft {
        /// Boolean column cleared on delete.
        flag: &'static str,
    },
}

// ============================================================================
// SECTION: Entity Schema
// ============================================================================

/// Static schema for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    /// Entity described by this schema.
    pub entity: EntityKind,
    /// Declared data columns (excluding id and timestamps).
    pub columns: &'static [ColumnSpec],
    /// Display joins applied on every read.
    pub joins: &'static [JoinSpec],
    /// Delete policy.
    pub delete_policy: DeletePolicy,
}

/// Validation failure listing every violated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fields: {}", fields.join(", "))]
pub struct ValidationError {
    /// Sorted, de-duplicated field names.
    pub fields: Vec<String>,
}

impl ValidationError {
    /// Builds a validation error from field names.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        Self {
            fields: fields.into_iter().collect(),
        }
    }
}

/// Field map validated and coerced against an entity schema.
///
/// # Invariants
/// - Only declared, non-managed columns appear, except on create where every
///   declared column is present.
/// - Values already match their column kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFields {
    /// Entity the fields were prepared for.
    entity: EntityKind,
    /// Coerced column values.
    values: FieldMap,
}

impl PreparedFields {
    /// Returns the entity the fields were prepared for.
    #[must_use]
    pub const fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Returns the prepared values.
    #[must_use]
    pub const fn values(&self) -> &FieldMap {
        &self.values
    }

    /// Consumes the wrapper and returns the prepared values.
    #[must_use]
    pub fn into_values(self) -> FieldMap {
        self.values
    }
}

impl EntitySchema {
    /// Returns the soft-delete flag column, if any.
    #[must_use]
    pub const fn soft_delete_flag(&self) -> Option<&'static str> {
        match self.delete_policy {
            DeletePolicy::Hard => None,
            DeletePolicy::Soft {
                flag,
            } => Some(flag),
        }
    }

    /// Prepares fields for a create call.
    ///
    /// Every declared column is present in the result; absent columns take
    /// their default.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a value cannot be coerced or a
    /// required column is blank.
    pub fn prepare_create(&self, input: &FieldMap) -> Result<PreparedFields, ValidationError> {
        let mut violations = Vec::new();
        let mut values = FieldMap::new();
        for column in self.columns {
            let supplied = if column.managed { None } else { input.get(column.name) };
            let value = match supplied {
                None | Some(Value::Null) => column.default.to_value(),
                Some(raw) => column.kind.coerce(raw).unwrap_or_else(|| {
                    violations.push(column.name);
                    Value::Null
                }),
            };
            if column.required && is_blank(&value) {
                violations.push(column.name);
            }
            values.insert(column.name.to_string(), value);
        }
        self.finish(values, violations)
    }

    /// Prepares fields for a partial update.
    ///
    /// Only supplied, writable columns appear in the result.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a value cannot be coerced or a
    /// required column is supplied blank.
    pub fn prepare_update(&self, input: &FieldMap) -> Result<PreparedFields, ValidationError> {
        let mut violations = Vec::new();
        let mut values = FieldMap::new();
        for column in self.columns.iter().filter(|column| !column.managed) {
            let Some(raw) = input.get(column.name) else {
                continue;
            };
            let Some(value) = column.kind.coerce(raw) else {
                violations.push(column.name);
                continue;
            };
            if column.required && is_blank(&value) {
                violations.push(column.name);
                continue;
            }
            values.insert(column.name.to_string(), value);
        }
        self.finish(values, violations)
    }

    /// Wraps prepared values or reports collected violations.
    fn finish(
        &self,
        values: FieldMap,
        violations: Vec<&'static str>,
    ) -> Result<PreparedFields, ValidationError> {
        if !violations.is_empty() {
            return Err(ValidationError::new(violations));
        }
        Ok(PreparedFields {
            entity: self.entity,
            values,
        })
    }
}

/// Returns true for null values and whitespace-only strings.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

// ============================================================================
// SECTION: Schema Table
// ============================================================================

/// Subscriber schema.
static USUARIOS: EntitySchema = EntitySchema {
    entity: EntityKind::Usuarios,
    columns: &[
        ColumnSpec::text("nombre").required(),
        ColumnSpec::text("email").unique(),
        ColumnSpec::text("dpi"),
        ColumnSpec::text("telefono"),
        ColumnSpec::integer("empresa_id"),
    ],
    joins: &[JoinSpec {
        foreign_key: "empresa_id",
        target: EntityKind::Empresas,
        alias: "empresa_nombre",
    }],
    delete_policy: DeletePolicy::Hard,
};

/// Corporate client schema.
static EMPRESAS: EntitySchema = EntitySchema {
    entity: EntityKind::Empresas,
    columns: &[
        ColumnSpec::text("nombre").required(),
        ColumnSpec::text("nit"),
        ColumnSpec::text("direccion"),
        ColumnSpec::text("telefono"),
        ColumnSpec::text("contacto"),
    ],
    joins: &[],
    delete_policy: DeletePolicy::Hard,
};

/// Plan schema.
static PLANES: EntitySchema = EntitySchema {
    entity: EntityKind::Planes,
    columns: &[
        ColumnSpec::text("nombre").required(),
        ColumnSpec::text("descripcion"),
        ColumnSpec::text("datos"),
        ColumnSpec::text("llamadas"),
        ColumnSpec::new("precio", ColumnKind::Decimal),
        ColumnSpec::integer("proveedor_id"),
    ],
    joins: &[JoinSpec {
        foreign_key: "proveedor_id",
        target: EntityKind::Proveedores,
        alias: "proveedor_nombre",
    }],
    delete_policy: DeletePolicy::Hard,
};

/// Provider schema.
static PROVEEDORES: EntitySchema = EntitySchema {
    entity: EntityKind::Proveedores,
    columns: &[
        ColumnSpec::text("nombre").required(),
        ColumnSpec::text("contacto"),
        ColumnSpec::text("telefono"),
    ],
    joins: &[],
    delete_policy: DeletePolicy::Hard,
};

/// Line schema.
static LINEAS: EntitySchema = EntitySchema {
    entity: EntityKind::Lineas,
    columns: &[
        ColumnSpec::text("numero").required().unique(),
        ColumnSpec::integer("usuario_id"),
        ColumnSpec::integer("empresa_id"),
        ColumnSpec::integer("plan_id"),
        ColumnSpec::integer("proveedor_id"),
        ColumnSpec::new("estado", ColumnKind::Enumerated(LINE_STATES))
            .with_default(ColumnDefault::Text(ACTIVE_LINE_STATE)),
        ColumnSpec::new("fecha_activacion", ColumnKind::Date),
        ColumnSpec::new("fecha_renovacion", ColumnKind::Date),
    ],
    joins: &[
        JoinSpec {
            foreign_key: "usuario_id",
            target: EntityKind::Usuarios,
            alias: "usuario_nombre",
        },
        JoinSpec {
            foreign_key: "empresa_id",
            target: EntityKind::Empresas,
            alias: "empresa_nombre",
        },
        JoinSpec {
            foreign_key: "plan_id",
            target: EntityKind::Planes,
            alias: "plan_nombre",
        },
        JoinSpec {
            foreign_key: "proveedor_id",
            target: EntityKind::Proveedores,
            alias: "proveedor_nombre",
        },
    ],
    delete_policy: DeletePolicy::Hard,
};

/// Advisor schema.
static ASESORES: EntitySchema = EntitySchema {
    entity: EntityKind::Asesores,
    columns: &[
        ColumnSpec::integer("proveedor_id").required(),
        ColumnSpec::text("nombre").required(),
        ColumnSpec::new("puesto", ColumnKind::Enumerated(ADVISOR_ROLES)).required(),
        ColumnSpec::text("correo"),
        ColumnSpec::text("telefono_fijo"),
        ColumnSpec::text("telefono_movil"),
        ColumnSpec::new("activo", ColumnKind::Bool)
            .managed()
            .with_default(ColumnDefault::Bool(true)),
    ],
    joins: &[JoinSpec {
        foreign_key: "proveedor_id",
        target: EntityKind::Proveedores,
        alias: "proveedor_nombre",
    }],
    delete_policy: DeletePolicy::Soft {
        flag: "activo",
    },
};

/// Returns the static schema for an entity.
#[must_use]
pub const fn schema_for(entity: EntityKind) -> &'static EntitySchema {
    match entity {
        EntityKind::Usuarios => &USUARIOS,
        EntityKind::Empresas => &EMPRESAS,
        EntityKind::Planes => &PLANES,
        EntityKind::Proveedores => &PROVEEDORES,
        EntityKind::Lineas => &LINEAS,
        EntityKind::Asesores => &ASESORES,
    }
}
