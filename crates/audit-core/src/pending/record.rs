//! PendingAuditRecord - one in-flight audit record per tracked entity
//!
//! Built during commit preparation, optionally finalized once after the
//! primary write (deferred values copied in), then converted into a durable
//! `AuditLog` and discarded.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::change::EntryToken;
use crate::entities::AuditLog;
use crate::error::{AuditError, AuditResult};
use crate::value_objects::Operation;

/// A field whose final value must be re-read after the primary write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredField {
    /// Field name as declared on the entity
    pub name: String,
    /// Resolving this field also resolves the record's entity id
    pub primary_key: bool,
    /// The resolved value belongs in the new-value snapshot
    ///
    /// False for a primary key excluded from value capture: the id is still
    /// identity, but its value stays out of the snapshot.
    pub audited: bool,
}

/// In-flight audit record for one entity in the pending unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuditRecord {
    /// Tracker handle used to re-read deferred values
    pub token: EntryToken,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub entity_type: String,
    pub operation: Operation,
    pub entity_id: Option<i64>,
    /// Pre-change values, in field declaration order
    pub old_values: Map<String, JsonValue>,
    /// Post-change values, in field declaration order
    pub new_values: Map<String, JsonValue>,
    /// Names of auditable fields the tracker marked changed
    pub changed_fields: Vec<String>,
    /// Fields awaiting their storage-assigned value
    pub deferred: Vec<DeferredField>,
}

impl PendingAuditRecord {
    /// Empty record for one tracked entity
    pub fn new(
        token: EntryToken,
        actor: impl Into<String>,
        timestamp: DateTime<Utc>,
        entity_type: impl Into<String>,
        operation: Operation,
    ) -> Self {
        Self {
            token,
            actor: actor.into(),
            timestamp,
            entity_type: entity_type.into(),
            operation,
            entity_id: None,
            old_values: Map::new(),
            new_values: Map::new(),
            changed_fields: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Whether finalization must wait for the primary write
    #[inline]
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Names of the fields to re-read after the primary write
    pub fn deferred_field_names(&self) -> Vec<String> {
        self.deferred.iter().map(|f| f.name.clone()).collect()
    }

    /// Copy resolved values into the record, consuming the deferred list
    ///
    /// Values are matched to deferred descriptors by field name; names the
    /// record never deferred are ignored. A resolved primary key that is not
    /// an integer leaves `entity_id` absent.
    pub fn apply_resolved(&mut self, resolved: &[(String, JsonValue)]) {
        let deferred = std::mem::take(&mut self.deferred);
        for descriptor in &deferred {
            let Some((_, value)) = resolved.iter().find(|(name, _)| *name == descriptor.name)
            else {
                continue;
            };
            if descriptor.audited {
                self.new_values
                    .insert(descriptor.name.clone(), value.clone());
            }
            if descriptor.primary_key {
                self.entity_id = value.as_i64();
            }
        }
    }

    /// Convert into the durable audit row
    ///
    /// Empty snapshots and change lists become absent columns.
    pub fn into_audit_log(self) -> AuditResult<AuditLog> {
        let old_values = serialize_map(&self.old_values)?;
        let new_values = serialize_map(&self.new_values)?;
        let changed_fields = if self.changed_fields.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&self.changed_fields)
                    .map_err(|e| AuditError::Internal(e.to_string()))?,
            )
        };

        Ok(AuditLog {
            id: 0,
            actor: self.actor,
            timestamp: self.timestamp,
            entity_type: self.entity_type,
            operation: self.operation,
            entity_id: self.entity_id,
            old_values,
            new_values,
            changed_fields,
        })
    }
}

fn serialize_map(map: &Map<String, JsonValue>) -> AuditResult<Option<String>> {
    if map.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(map)
        .map(Some)
        .map_err(|e| AuditError::Internal(e.to_string()))
}
