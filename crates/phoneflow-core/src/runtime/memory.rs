// crates/phoneflow-core/src/runtime/memory.rs
// ============================================================================
// Module: PhoneFlow In-Memory Store
// Description: Process-local fallback store with per-entity locking.
// Purpose: Serve every entity when no relational backend is available.
// Dependencies: serde_json, time, crate::{core, interfaces, runtime::fixtures}
// ============================================================================

//! ## Overview
//! [`InMemoryDatabase`] keeps one mutex-guarded table per entity. Ids come
//! from a per-table counter that only moves forward, so ids are never reused
//! even after deletes. Reads apply the same joins, soft-delete filtering, and
//! newest-first ordering as the relational adapter.
//!
//! Join enrichment releases the source table lock before touching a target
//! table, so two locks are never held at once.
//!
//! Records live only for the process lifetime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde_json::Value;
use time::OffsetDateTime;

use crate::core::Clock;
use crate::core::EntityKind;
use crate::core::EntitySchema;
use crate::core::FieldMap;
use crate::core::PreparedFields;
use crate::core::Record;
use crate::core::RecordId;
use crate::core::SystemClock;
use crate::core::schema::DISPLAY_COLUMN;
use crate::core::time::truncate_to_millis;
use crate::interfaces::EntityStore;
use crate::interfaces::RecordSource;
use crate::interfaces::StoreError;
use crate::interfaces::ensure_entity;
use crate::runtime::fixtures::Fixture;
use crate::runtime::fixtures::default_fixtures;

// ============================================================================
// SECTION: Tables
// ============================================================================

/// Row as held by the in-memory table.
#[derive(Debug, Clone)]
struct StoredRow {
    /// Assigned identifier.
    id: RecordId,
    /// Column values (every declared column present).
    values: FieldMap,
    /// Creation instant.
    created_at: OffsetDateTime,
    /// Last update instant.
    updated_at: OffsetDateTime,
}

impl StoredRow {
    /// Returns true unless the row carries a cleared soft-delete flag.
    fn is_live(&self, schema: &EntitySchema) -> bool {
        schema
            .soft_delete_flag()
            .is_none_or(|flag| self.values.get(flag) != Some(&Value::Bool(false)))
    }
}

/// One entity's rows plus its id counter.
#[derive(Debug, Default)]
struct MemoryTable {
    /// Last id handed out.
    last_id: i64,
    /// Rows keyed by id.
    rows: BTreeMap<RecordId, StoredRow>,
}

impl MemoryTable {
    /// Reserves the next identifier.
    fn allocate_id(&mut self) -> Result<RecordId, StoreError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Store("record id counter overflow".to_string()))?;
        let id = RecordId::new(next).map_err(|err| StoreError::Store(err.to_string()))?;
        self.last_id = next;
        Ok(id)
    }

    /// Returns a live row by id.
    fn live_row(&self, schema: &EntitySchema, id: RecordId) -> Option<&StoredRow> {
        self.rows.get(&id).filter(|row| row.is_live(schema))
    }

    /// Returns a live row by id for mutation.
    fn live_row_mut(&mut self, schema: &EntitySchema, id: RecordId) -> Option<&mut StoredRow> {
        self.rows.get_mut(&id).filter(|row| row.is_live(schema))
    }

    /// Rejects values that collide with a unique column on another live row.
    fn ensure_unique(
        &self,
        schema: &EntitySchema,
        values: &FieldMap,
        exclude: Option<RecordId>,
    ) -> Result<(), StoreError> {
        for column in schema.columns.iter().filter(|column| column.unique) {
            let Some(candidate) = values.get(column.name).filter(|value| !value.is_null()) else {
                continue;
            };
            let collision = self.rows.values().any(|row| {
                Some(row.id) != exclude
                    && row.is_live(schema)
                    && row.values.get(column.name) == Some(candidate)
            });
            if collision {
                return Err(StoreError::Duplicate {
                    entity: schema.entity,
                    field: column.name.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Database
// ============================================================================

/// In-memory database holding every entity table.
pub struct InMemoryDatabase {
    /// Per-entity tables, each behind its own lock.
    tables: BTreeMap<EntityKind, Mutex<MemoryTable>>,
    /// Clock used for timestamps.
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatabase {
    /// Creates an empty database stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty database stamped by the provided clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let tables =
            EntityKind::ALL.into_iter().map(|kind| (kind, Mutex::new(MemoryTable::default())));
        Self {
            tables: tables.collect(),
            clock,
        }
    }

    /// Creates a database seeded with [`default_fixtures`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a fixture fails validation.
    pub fn seeded() -> Result<Self, StoreError> {
        let database = Self::new();
        database.seed(&default_fixtures())?;
        Ok(database)
    }

    /// Inserts fixture rows in order through the regular create path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when a fixture fails validation.
    pub fn seed(&self, fixtures: &[Fixture]) -> Result<(), StoreError> {
        for fixture in fixtures {
            let prepared = fixture.entity.schema().prepare_create(&fixture.fields).map_err(
                |err| StoreError::Invalid(format!("{} fixture rejected: {err}", fixture.entity)),
            )?;
            self.create_record(prepared)?;
        }
        Ok(())
    }

    /// Returns a store handle for one entity.
    #[must_use]
    pub fn store(self: &Arc<Self>, entity: EntityKind) -> InMemoryEntityStore {
        InMemoryEntityStore {
            database: Arc::clone(self),
            entity,
        }
    }

    /// Locks an entity table.
    fn table(&self, entity: EntityKind) -> Result<MutexGuard<'_, MemoryTable>, StoreError> {
        self.tables
            .get(&entity)
            .ok_or_else(|| StoreError::Store(format!("missing in-memory table: {entity}")))?
            .lock()
            .map_err(|_| StoreError::Store(format!("{entity} table mutex poisoned")))
    }

    /// Returns the current instant at millisecond precision.
    fn now(&self) -> OffsetDateTime {
        truncate_to_millis(self.clock.now())
    }

    /// Lists live records newest first.
    fn list_records(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError> {
        let schema = entity.schema();
        let mut rows: Vec<StoredRow> = {
            let table = self.table(entity)?;
            table.rows.values().filter(|row| row.is_live(schema)).cloned().collect()
        };
        rows.sort_by(|left, right| {
            right.created_at.cmp(&left.created_at).then_with(|| right.id.cmp(&left.id))
        });
        rows.into_iter().map(|row| self.enrich(schema, row)).collect()
    }

    /// Fetches one live record.
    fn get_record(&self, entity: EntityKind, id: RecordId) -> Result<Record, StoreError> {
        let schema = entity.schema();
        let row = {
            let table = self.table(entity)?;
            table.live_row(schema, id).cloned()
        };
        let row = row.ok_or(StoreError::NotFound {
            entity,
            id,
        })?;
        self.enrich(schema, row)
    }

    /// Inserts a record with a fresh id.
    fn create_record(&self, fields: PreparedFields) -> Result<Record, StoreError> {
        let entity = fields.entity();
        let schema = entity.schema();
        let values = fields.into_values();
        let now = self.now();
        let row = {
            let mut table = self.table(entity)?;
            table.ensure_unique(schema, &values, None)?;
            let id = table.allocate_id()?;
            let row = StoredRow {
                id,
                values,
                created_at: now,
                updated_at: now,
            };
            table.rows.insert(id, row.clone());
            row
        };
        self.enrich(schema, row)
    }

    /// Merges supplied fields into a live record.
    fn update_record(
        &self,
        entity: EntityKind,
        id: RecordId,
        fields: PreparedFields,
    ) -> Result<Record, StoreError> {
        let schema = entity.schema();
        let changes = fields.into_values();
        let now = self.now();
        let row = {
            let mut table = self.table(entity)?;
            let mut merged = table
                .live_row(schema, id)
                .ok_or(StoreError::NotFound {
                    entity,
                    id,
                })?
                .values
                .clone();
            merged.extend(changes);
            table.ensure_unique(schema, &merged, Some(id))?;
            let row = table.live_row_mut(schema, id).ok_or(StoreError::NotFound {
                entity,
                id,
            })?;
            row.values = merged;
            row.updated_at = now;
            row.clone()
        };
        self.enrich(schema, row)
    }

    /// Removes or flags a live record.
    fn delete_record(&self, entity: EntityKind, id: RecordId) -> Result<(), StoreError> {
        let schema = entity.schema();
        let now = self.now();
        let mut table = self.table(entity)?;
        if table.live_row(schema, id).is_none() {
            return Err(StoreError::NotFound {
                entity,
                id,
            });
        }
        match schema.soft_delete_flag() {
            None => {
                table.rows.remove(&id);
            }
            Some(flag) => {
                if let Some(row) = table.live_row_mut(schema, id) {
                    row.values.insert(flag.to_string(), Value::Bool(false));
                    row.updated_at = now;
                }
            }
        }
        drop(table);
        Ok(())
    }

    /// Adds join display fields to a row.
    fn enrich(&self, schema: &EntitySchema, row: StoredRow) -> Result<Record, StoreError> {
        let mut fields = row.values;
        for join in schema.joins {
            let target_id = fields
                .get(join.foreign_key)
                .and_then(Value::as_i64)
                .and_then(|raw| RecordId::new(raw).ok());
            let display = match target_id {
                Some(target_id) => self.display_name(join.target, target_id)?,
                None => Value::Null,
            };
            fields.insert(join.alias.to_string(), display);
        }
        Ok(Record {
            id: row.id,
            fields,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    /// Looks up a target row's display name, ignoring soft-delete flags.
    fn display_name(&self, target: EntityKind, id: RecordId) -> Result<Value, StoreError> {
        let table = self.table(target)?;
        Ok(table
            .rows
            .get(&id)
            .and_then(|row| row.values.get(DISPLAY_COLUMN))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

impl RecordSource for InMemoryDatabase {
    fn records(&self, entity: EntityKind) -> Result<Vec<Record>, StoreError> {
        self.list_records(entity)
    }
}

// ============================================================================
// SECTION: Entity Store Handle
// ============================================================================

/// Entity store view over a shared [`InMemoryDatabase`].
#[derive(Clone)]
pub struct InMemoryEntityStore {
    /// Shared database.
    database: Arc<InMemoryDatabase>,
    /// Entity served by this handle.
    entity: EntityKind,
}

impl EntityStore for InMemoryEntityStore {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.database.list_records(self.entity)
    }

    fn get(&self, id: RecordId) -> Result<Record, StoreError> {
        self.database.get_record(self.entity, id)
    }

    fn create(&self, fields: PreparedFields) -> Result<Record, StoreError> {
        ensure_entity(self.entity, &fields)?;
        self.database.create_record(fields)
    }

    fn update(&self, id: RecordId, fields: PreparedFields) -> Result<Record, StoreError> {
        ensure_entity(self.entity, &fields)?;
        self.database.update_record(self.entity, id, fields)
    }

    fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        self.database.delete_record(self.entity, id)
    }
}
