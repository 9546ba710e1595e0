//! AuditLog - one durable audit row per affected entity per commit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::value_objects::Operation;

/// Maximum stored length for the actor identity
pub const MAX_ACTOR_LEN: usize = 254;

/// Maximum stored length for entity type names
pub const MAX_TYPE_NAME_LEN: usize = 100;

/// Durable audit record written to the append-only audit table
///
/// Value snapshots and the changed-field list are stored as JSON text so the
/// row can be inspected outside the issuing process without the entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    /// Surrogate key assigned by storage; 0 until the row is written
    pub id: i64,
    /// Who performed the change
    pub actor: String,
    /// When the change was made, as supplied by the caller
    pub timestamp: DateTime<Utc>,
    /// Type name of the audited entity
    pub entity_type: String,
    /// What happened to the entity
    pub operation: Operation,
    /// Single-integer primary key; None for composite or non-integer keys
    pub entity_id: Option<i64>,
    /// JSON object of pre-change values; present for Modified/Deleted
    pub old_values: Option<String>,
    /// JSON object of post-change values; present for Added/Modified
    pub new_values: Option<String>,
    /// JSON array of changed field names; present only for Modified
    pub changed_fields: Option<String>,
}

impl AuditLog {
    /// Parse the old-value snapshot back into a map
    ///
    /// None when the column is absent or does not hold a JSON object.
    pub fn old_values_map(&self) -> Option<Map<String, JsonValue>> {
        parse_object(self.old_values.as_deref())
    }

    /// Parse the new-value snapshot back into a map
    pub fn new_values_map(&self) -> Option<Map<String, JsonValue>> {
        parse_object(self.new_values.as_deref())
    }

    /// Parse the changed-field list back into names
    pub fn changed_field_names(&self) -> Option<Vec<String>> {
        let raw = self.changed_fields.as_deref()?;
        serde_json::from_str(raw).ok()
    }
}

fn parse_object(raw: Option<&str>) -> Option<Map<String, JsonValue>> {
    serde_json::from_str(raw?).ok()
}
