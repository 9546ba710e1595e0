//! Editable-entity capability - created/updated stamp fields
//!
//! Entities that opt in carry four well-known fields, owned by the entity and
//! persisted by the primary write like any other column. The orchestrator
//! stamps them before the write; whether an entity carries the capability is
//! an explicit flag on its change snapshot, populated by the engine adapter.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::value_objects::Operation;

/// Actor that created the entity
pub const CREATED_BY: &str = "created_by";
/// When the entity was created
pub const CREATED_ON: &str = "created_on";
/// Actor of the most recent change
pub const UPDATED_BY: &str = "updated_by";
/// When the most recent change was made
pub const UPDATED_ON: &str = "updated_on";

/// Stamp fields to set for an editable entity under the given operation
///
/// Added and Modified entities get `updated_by`/`updated_on`; Added entities
/// additionally get `created_by`/`created_on`. Deleted entities are left
/// alone. Returns `(field, value)` pairs ready for the engine port.
pub fn stamp_fields(
    operation: Operation,
    actor: &str,
    timestamp: DateTime<Utc>,
) -> Vec<(&'static str, JsonValue)> {
    let when = JsonValue::String(timestamp.to_rfc3339());
    let who = JsonValue::String(actor.to_string());

    match operation {
        Operation::Added => vec![
            (UPDATED_BY, who.clone()),
            (UPDATED_ON, when.clone()),
            (CREATED_BY, who),
            (CREATED_ON, when),
        ],
        Operation::Modified => vec![(UPDATED_BY, who), (UPDATED_ON, when)],
        Operation::Deleted => Vec::new(),
    }
}
