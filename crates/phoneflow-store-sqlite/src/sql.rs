// crates/phoneflow-store-sqlite/src/sql.rs
// ============================================================================
// Module: SQLite Statement Builders
// Description: SQL text generated from static entity schemas.
// Purpose: Keep identifiers schema-derived and values parameter-bound.
// Dependencies: phoneflow-core
// ============================================================================

//! ## Overview
//! Every identifier in generated SQL comes from the static
//! [`EntitySchema`] tables compiled into `phoneflow-core`; caller data only
//! ever travels as bound parameters. The row layout produced by
//! [`select_sql`] is `id, created_at, updated_at`, then the declared columns
//! in schema order, then one display column per join.

// ============================================================================
// SECTION: Imports
// ============================================================================

use phoneflow_core::EntitySchema;
use phoneflow_core::schema::DISPLAY_COLUMN;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of leading bookkeeping columns in a select row.
pub const LEADING_COLUMNS: usize = 3;

// ============================================================================
// SECTION: DDL
// ============================================================================

/// Returns the `CREATE TABLE` and index statements for an entity.
#[must_use]
pub fn create_table_sql(schema: &EntitySchema) -> String {
    let table = schema.entity.name();
    let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    for column in schema.columns {
        let unique = if column.unique { " UNIQUE" } else { "" };
        columns.push(format!("{} {}{unique}", column.name, column.kind.sql_type()));
    }
    columns.push("created_at INTEGER NOT NULL".to_string());
    columns.push("updated_at INTEGER NOT NULL".to_string());
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n    {}\n);\nCREATE INDEX IF NOT EXISTS \
         idx_{table}_created_at ON {table} (created_at);",
        columns.join(",\n    ")
    )
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Returns the predicate selecting live rows of alias `t`.
fn live_predicate(schema: &EntitySchema) -> String {
    schema.soft_delete_flag().map_or_else(|| "1 = 1".to_string(), |flag| format!("t.{flag} = 1"))
}

/// Returns the join-enriched select without filters.
#[must_use]
pub fn select_sql(schema: &EntitySchema) -> String {
    let mut columns = vec!["t.id".to_string(), "t.created_at".to_string(), "t.updated_at".to_string()];
    columns.extend(schema.columns.iter().map(|column| format!("t.{}", column.name)));
    let mut joins = String::new();
    for (index, join) in schema.joins.iter().enumerate() {
        columns.push(format!("j{index}.{DISPLAY_COLUMN} AS {}", join.alias));
        joins.push_str(&format!(
            " LEFT JOIN {} j{index} ON j{index}.id = t.{}",
            join.target.name(),
            join.foreign_key
        ));
    }
    format!("SELECT {} FROM {} t{joins}", columns.join(", "), schema.entity.name())
}

/// Returns the newest-first listing of live rows.
#[must_use]
pub fn list_sql(schema: &EntitySchema) -> String {
    format!(
        "{} WHERE {} ORDER BY t.created_at DESC, t.id DESC",
        select_sql(schema),
        live_predicate(schema)
    )
}

/// Returns the single live-row fetch bound to `?1`.
#[must_use]
pub fn get_sql(schema: &EntitySchema) -> String {
    format!("{} WHERE t.id = ?1 AND {}", select_sql(schema), live_predicate(schema))
}

/// Returns the live-row existence probe bound to `?1`.
#[must_use]
pub fn exists_sql(schema: &EntitySchema) -> String {
    format!("SELECT 1 FROM {} t WHERE t.id = ?1 AND {}", schema.entity.name(), live_predicate(schema))
}

/// Returns the unique-value probe bound to `?1` (value) and `?2` (excluded id).
#[must_use]
pub fn unique_probe_sql(schema: &EntitySchema, column: &str) -> String {
    format!(
        "SELECT 1 FROM {} t WHERE t.{column} = ?1 AND t.id != ?2 AND {} LIMIT 1",
        schema.entity.name(),
        live_predicate(schema)
    )
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Returns the insert covering every declared column plus timestamps.
#[must_use]
pub fn insert_sql(schema: &EntitySchema) -> String {
    let mut names: Vec<&str> = schema.columns.iter().map(|column| column.name).collect();
    names.push("created_at");
    names.push("updated_at");
    let placeholders: Vec<String> = (1..=names.len()).map(|index| format!("?{index}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.entity.name(),
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Returns a partial update of `columns` plus `updated_at`.
///
/// Parameters bind in order: each column, then `updated_at`, then the id.
#[must_use]
pub fn update_sql(schema: &EntitySchema, columns: &[&str]) -> String {
    let mut assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(index, name)| format!("{name} = ?{}", index + 1))
        .collect();
    assignments.push(format!("updated_at = ?{}", columns.len() + 1));
    format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        schema.entity.name(),
        assignments.join(", "),
        columns.len() + 2
    )
}

/// Returns the delete statement for the entity's policy.
///
/// Hard deletes bind the id to `?1`; soft deletes bind `updated_at` to `?1`
/// and the id to `?2`.
#[must_use]
pub fn delete_sql(schema: &EntitySchema) -> String {
    let table = schema.entity.name();
    match schema.soft_delete_flag() {
        None => format!("DELETE FROM {table} WHERE id = ?1"),
        Some(flag) => {
            format!("UPDATE {table} SET {flag} = 0, updated_at = ?1 WHERE id = ?2 AND {flag} = 1")
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
