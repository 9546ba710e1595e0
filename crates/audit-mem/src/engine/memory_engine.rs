//! MemoryEngine - deterministic in-memory ChangeEngine implementation
//!
//! Rows live in per-type tables keyed by a single integer surrogate key.
//! Inserts track negative placeholder keys until flush assigns the real
//! sequence value; generated columns are simulated (version seed 1 on
//! insert, previous value + 1 on update). Transactions are a snapshot of
//! committed state: rollback restores it, commit drops it. Isolation is not
//! modeled; transactions provide rollback, not invisibility.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, instrument};

use audit_core::{
    AuditError, AuditLog, AuditResult, ChangeEngine, EntityChange, EntryToken, FieldState,
    Operation, ValueGeneration,
};

use crate::schema::EntitySchema;

type Row = Map<String, JsonValue>;

/// One tracked entity in the pending unit of work
#[derive(Debug, Clone)]
struct TrackedEntry {
    token: EntryToken,
    entity_type: String,
    operation: Operation,
    /// Committed-row key for Modified/Deleted entries
    row_key: Option<i64>,
    fields: Vec<FieldState>,
}

/// Post-flush field values, kept so deferred audit capture can re-read them
#[derive(Debug, Clone)]
struct ResolvedEntry {
    entity_type: String,
    values: Vec<(String, JsonValue)>,
}

/// State restored wholesale on transaction rollback
#[derive(Debug, Clone, Default)]
struct CommittedState {
    rows: HashMap<String, Vec<Row>>,
    audit_logs: Vec<AuditLog>,
    next_keys: HashMap<String, i64>,
    next_audit_id: i64,
}

#[derive(Debug, Default)]
struct Inner {
    schemas: HashMap<String, EntitySchema>,
    state: CommittedState,
    tracked: Vec<TrackedEntry>,
    staged_audit: Vec<AuditLog>,
    resolved: HashMap<u64, ResolvedEntry>,
    next_token: u64,
    tx_snapshot: Option<CommittedState>,
    flushes_until_failure: Option<u64>,
}

/// Deterministic in-memory persistence engine with change tracking
#[derive(Debug, Default)]
pub struct MemoryEngine {
    inner: Mutex<Inner>,
}

impl MemoryEngine {
    /// Engine with no registered entity types
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type
    #[must_use]
    pub fn with_schema(self, schema: EntitySchema) -> Self {
        self.inner
            .lock()
            .schemas
            .insert(schema.name.clone(), schema);
        self
    }

    /// Track a new entity for insertion
    ///
    /// Fields with a generated-on-add primary key receive a negative
    /// placeholder until flush assigns the real key. Unknown field names are
    /// rejected; omitted fields default to null.
    pub fn insert<I, S>(&self, entity_type: &str, values: I) -> AuditResult<EntryToken>
    where
        I: IntoIterator<Item = (S, JsonValue)>,
        S: Into<String>,
    {
        let mut provided: Row = values.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut inner = self.inner.lock();
        let schema = lookup_schema(&inner.schemas, entity_type)?.clone();
        validate_field_names(&schema, &provided)?;

        inner.next_token += 1;
        let token = EntryToken::new(inner.next_token);

        let fields = schema
            .fields
            .iter()
            .map(|field_schema| {
                let mut field =
                    FieldState::new(field_schema.name.clone(), JsonValue::Null, JsonValue::Null);
                field.primary_key = field_schema.primary_key;
                field.generated = field_schema.generated;
                if field_schema.primary_key && field_schema.generated == ValueGeneration::OnAdd {
                    // Placeholder key, unique per tracked entry
                    field.current = json!(-(token.into_inner() as i64));
                    field.temporary = true;
                } else if let Some(value) = provided.remove(&field_schema.name) {
                    field.current = value;
                }
                field
            })
            .collect();

        inner.tracked.push(TrackedEntry {
            token,
            entity_type: entity_type.to_string(),
            operation: Operation::Added,
            row_key: None,
            fields,
        });

        Ok(token)
    }

    /// Track changes to a committed row
    pub fn update<I, S>(&self, entity_type: &str, key: i64, changes: I) -> AuditResult<EntryToken>
    where
        I: IntoIterator<Item = (S, JsonValue)>,
        S: Into<String>,
    {
        let mut changed: Row = changes.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut inner = self.inner.lock();
        let schema = lookup_schema(&inner.schemas, entity_type)?.clone();
        validate_field_names(&schema, &changed)?;
        let row = find_row(&inner.state.rows, &schema, entity_type, key)?.clone();

        inner.next_token += 1;
        let token = EntryToken::new(inner.next_token);

        let fields = schema
            .fields
            .iter()
            .map(|field_schema| {
                let original = row.get(&field_schema.name).cloned().unwrap_or(JsonValue::Null);
                let mut field =
                    FieldState::new(field_schema.name.clone(), original.clone(), original);
                field.primary_key = field_schema.primary_key;
                field.generated = field_schema.generated;
                if let Some(value) = changed.remove(&field_schema.name) {
                    field.current = value;
                    field.modified = true;
                }
                field
            })
            .collect();

        inner.tracked.push(TrackedEntry {
            token,
            entity_type: entity_type.to_string(),
            operation: Operation::Modified,
            row_key: Some(key),
            fields,
        });

        Ok(token)
    }

    /// Track a committed row for deletion
    pub fn delete(&self, entity_type: &str, key: i64) -> AuditResult<EntryToken> {
        let mut inner = self.inner.lock();
        let schema = lookup_schema(&inner.schemas, entity_type)?.clone();
        let row = find_row(&inner.state.rows, &schema, entity_type, key)?.clone();

        inner.next_token += 1;
        let token = EntryToken::new(inner.next_token);

        let fields = schema
            .fields
            .iter()
            .map(|field_schema| {
                let value = row.get(&field_schema.name).cloned().unwrap_or(JsonValue::Null);
                let mut field =
                    FieldState::new(field_schema.name.clone(), value.clone(), value);
                field.primary_key = field_schema.primary_key;
                field.generated = field_schema.generated;
                field
            })
            .collect();

        inner.tracked.push(TrackedEntry {
            token,
            entity_type: entity_type.to_string(),
            operation: Operation::Deleted,
            row_key: Some(key),
            fields,
        });

        Ok(token)
    }

    /// Committed row by key, for assertions and read paths
    pub fn get(&self, entity_type: &str, key: i64) -> Option<Row> {
        let inner = self.inner.lock();
        let schema = inner.schemas.get(entity_type)?;
        let key_name = &schema.single_key()?.name;
        inner
            .state
            .rows
            .get(entity_type)?
            .iter()
            .find(|row| row.get(key_name).and_then(JsonValue::as_i64) == Some(key))
            .cloned()
    }

    /// Number of committed rows of a type
    pub fn row_count(&self, entity_type: &str) -> usize {
        self.inner
            .lock()
            .state
            .rows
            .get(entity_type)
            .map_or(0, Vec::len)
    }

    /// Committed audit rows, in write order
    pub fn audit_logs(&self) -> Vec<AuditLog> {
        self.inner.lock().state.audit_logs.clone()
    }

    /// Make the nth upcoming flush fail (1 = the next one)
    ///
    /// The failure consumes the injection; later flushes succeed again.
    pub fn fail_on_flush(&self, nth: u64) {
        self.inner.lock().flushes_until_failure = Some(nth);
    }
}

#[async_trait]
impl ChangeEngine for MemoryEngine {
    fn pending_changes(&self) -> Vec<EntityChange> {
        let inner = self.inner.lock();
        inner
            .tracked
            .iter()
            .map(|entry| EntityChange {
                token: entry.token,
                entity_type: entry.entity_type.clone(),
                operation: entry.operation,
                editable: inner
                    .schemas
                    .get(&entry.entity_type)
                    .is_some_and(|s| s.editable),
                fields: entry.fields.clone(),
            })
            .collect()
    }

    fn set_current_value(
        &self,
        token: EntryToken,
        field: &str,
        value: JsonValue,
    ) -> AuditResult<()> {
        let mut inner = self.inner.lock();
        let entry = inner
            .tracked
            .iter_mut()
            .find(|entry| entry.token == token)
            .ok_or(AuditError::UnknownEntry(token))?;

        let operation = entry.operation;
        let state = entry
            .fields
            .iter_mut()
            .find(|f| f.name == field)
            .ok_or_else(|| {
                AuditError::Internal(format!(
                    "unknown field `{field}` on {}",
                    entry.entity_type
                ))
            })?;

        state.current = value;
        if operation == Operation::Modified {
            state.modified = true;
        }
        Ok(())
    }

    fn read_current_values(
        &self,
        token: EntryToken,
        fields: &[String],
    ) -> AuditResult<Vec<(String, JsonValue)>> {
        let inner = self.inner.lock();

        if let Some(resolved) = inner.resolved.get(&token.into_inner()) {
            return fields
                .iter()
                .map(|name| {
                    resolved
                        .values
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(n, v)| (n.clone(), v.clone()))
                        .ok_or_else(|| AuditError::UnresolvedField {
                            entity_type: resolved.entity_type.clone(),
                            field: name.clone(),
                        })
                })
                .collect();
        }

        if let Some(entry) = inner.tracked.iter().find(|entry| entry.token == token) {
            return fields
                .iter()
                .map(|name| {
                    let state = entry.fields.iter().find(|f| f.name == *name);
                    match state {
                        Some(state) if !state.temporary => {
                            Ok((state.name.clone(), state.current.clone()))
                        }
                        _ => Err(AuditError::UnresolvedField {
                            entity_type: entry.entity_type.clone(),
                            field: name.clone(),
                        }),
                    }
                })
                .collect();
        }

        Err(AuditError::UnknownEntry(token))
    }

    fn stage_audit_logs(&self, logs: Vec<AuditLog>) -> AuditResult<()> {
        self.inner.lock().staged_audit.extend(logs);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.inner.lock().tx_snapshot.is_some()
    }

    async fn begin_transaction(&self) -> AuditResult<()> {
        let mut inner = self.inner.lock();
        if inner.tx_snapshot.is_some() {
            return Err(AuditError::Persistence(
                "a transaction is already open".to_string(),
            ));
        }
        inner.tx_snapshot = Some(inner.state.clone());
        Ok(())
    }

    async fn commit_transaction(&self) -> AuditResult<()> {
        let mut inner = self.inner.lock();
        if inner.tx_snapshot.take().is_none() {
            return Err(AuditError::Persistence("no open transaction".to_string()));
        }
        Ok(())
    }

    async fn rollback_transaction(&self) -> AuditResult<()> {
        let mut inner = self.inner.lock();
        let snapshot = inner
            .tx_snapshot
            .take()
            .ok_or_else(|| AuditError::Persistence("no open transaction".to_string()))?;
        inner.state = snapshot;
        // The aborted unit of work is gone with the transaction
        inner.tracked.clear();
        inner.staged_audit.clear();
        inner.resolved.clear();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn flush(&self) -> AuditResult<u64> {
        let mut inner = self.inner.lock();

        if let Some(remaining) = inner.flushes_until_failure {
            if remaining <= 1 {
                inner.flushes_until_failure = None;
                return Err(AuditError::Persistence(
                    "injected flush failure".to_string(),
                ));
            }
            inner.flushes_until_failure = Some(remaining - 1);
        }

        let entries = std::mem::take(&mut inner.tracked);
        let rows_written = entries.len() as u64;

        for mut entry in entries {
            match entry.operation {
                Operation::Added => {
                    let next_key = inner
                        .state
                        .next_keys
                        .entry(entry.entity_type.clone())
                        .or_insert(1);
                    for field in &mut entry.fields {
                        if field.temporary {
                            field.current = json!(*next_key);
                            field.temporary = false;
                            *next_key += 1;
                        } else if field.generated == ValueGeneration::OnAdd && !field.primary_key {
                            // Computed-on-insert columns seed at 1
                            field.current = json!(1);
                        }
                    }
                    let row: Row = entry
                        .fields
                        .iter()
                        .map(|f| (f.name.clone(), f.current.clone()))
                        .collect();
                    inner
                        .state
                        .rows
                        .entry(entry.entity_type.clone())
                        .or_default()
                        .push(row);
                }
                Operation::Modified => {
                    for field in &mut entry.fields {
                        if field.generated.applies_to(Operation::Modified) {
                            field.current =
                                json!(field.original.as_i64().map_or(1, |v| v + 1));
                        }
                    }
                    let schema = lookup_schema(&inner.schemas, &entry.entity_type)?.clone();
                    let key = entry.row_key.ok_or(AuditError::UnknownEntry(entry.token))?;
                    let updated: Row = entry
                        .fields
                        .iter()
                        .map(|f| (f.name.clone(), f.current.clone()))
                        .collect();
                    let row =
                        find_row_mut(&mut inner.state.rows, &schema, &entry.entity_type, key)?;
                    *row = updated;
                }
                Operation::Deleted => {
                    let schema = lookup_schema(&inner.schemas, &entry.entity_type)?.clone();
                    let key = entry.row_key.ok_or(AuditError::UnknownEntry(entry.token))?;
                    remove_row(&mut inner.state.rows, &schema, &entry.entity_type, key)?;
                }
            }

            inner.resolved.insert(
                entry.token.into_inner(),
                ResolvedEntry {
                    entity_type: entry.entity_type.clone(),
                    values: entry
                        .fields
                        .iter()
                        .map(|f| (f.name.clone(), f.current.clone()))
                        .collect(),
                },
            );
        }

        let staged: Vec<AuditLog> = inner.staged_audit.drain(..).collect();
        for mut log in staged {
            inner.state.next_audit_id += 1;
            log.id = inner.state.next_audit_id;
            inner.state.audit_logs.push(log);
        }

        debug!(rows = rows_written, "flushed unit of work");
        Ok(rows_written)
    }
}

fn lookup_schema<'a>(
    schemas: &'a HashMap<String, EntitySchema>,
    entity_type: &str,
) -> AuditResult<&'a EntitySchema> {
    schemas
        .get(entity_type)
        .ok_or_else(|| AuditError::Persistence(format!("unknown entity type: {entity_type}")))
}

fn validate_field_names(schema: &EntitySchema, values: &Row) -> AuditResult<()> {
    for name in values.keys() {
        if schema.field_by_name(name).is_none() {
            return Err(AuditError::Persistence(format!(
                "unknown field `{name}` on {}",
                schema.name
            )));
        }
    }
    Ok(())
}

fn key_field_name<'a>(schema: &'a EntitySchema, entity_type: &str) -> AuditResult<&'a str> {
    schema
        .single_key()
        .map(|f| f.name.as_str())
        .ok_or_else(|| {
            AuditError::Persistence(format!(
                "entity type {entity_type} has no single integer key"
            ))
        })
}

fn row_position(
    rows: &HashMap<String, Vec<Row>>,
    key_name: &str,
    entity_type: &str,
    key: i64,
) -> Option<usize> {
    rows.get(entity_type)?
        .iter()
        .position(|row| row.get(key_name).and_then(JsonValue::as_i64) == Some(key))
}

fn find_row<'a>(
    rows: &'a HashMap<String, Vec<Row>>,
    schema: &EntitySchema,
    entity_type: &str,
    key: i64,
) -> AuditResult<&'a Row> {
    let key_name = key_field_name(schema, entity_type)?;
    row_position(rows, key_name, entity_type, key)
        .and_then(|pos| rows.get(entity_type)?.get(pos))
        .ok_or_else(|| missing_row(entity_type, key))
}

fn find_row_mut<'a>(
    rows: &'a mut HashMap<String, Vec<Row>>,
    schema: &EntitySchema,
    entity_type: &str,
    key: i64,
) -> AuditResult<&'a mut Row> {
    let key_name = key_field_name(schema, entity_type)?;
    let pos = row_position(rows, key_name, entity_type, key)
        .ok_or_else(|| missing_row(entity_type, key))?;
    rows.get_mut(entity_type)
        .and_then(|table| table.get_mut(pos))
        .ok_or_else(|| missing_row(entity_type, key))
}

fn remove_row(
    rows: &mut HashMap<String, Vec<Row>>,
    schema: &EntitySchema,
    entity_type: &str,
    key: i64,
) -> AuditResult<()> {
    let key_name = key_field_name(schema, entity_type)?;
    let pos = row_position(rows, key_name, entity_type, key)
        .ok_or_else(|| missing_row(entity_type, key))?;
    if let Some(table) = rows.get_mut(entity_type) {
        table.remove(pos);
    }
    Ok(())
}

fn missing_row(entity_type: &str, key: i64) -> AuditError {
    AuditError::Persistence(format!("no committed {entity_type} row with key {key}"))
}
