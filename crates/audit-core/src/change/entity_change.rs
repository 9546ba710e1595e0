//! EntityChange - one tracked entity with its field-level metadata
//!
//! The persistence engine produces these snapshots for every entity in the
//! pending unit of work. They are plain data: inspecting them never touches
//! storage and never mutates the tracker.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::value_objects::{Operation, ValueGeneration};

/// Opaque handle to a tracked entry inside the engine's change tracker
///
/// Stays valid across the primary write, so deferred field values can be
/// re-read from the same entry after the engine has assigned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryToken(u64);

impl EntryToken {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a single tracked field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    /// Field name as declared on the entity
    pub name: String,
    /// Value about to be written
    pub current: JsonValue,
    /// Value as originally loaded from storage
    pub original: JsonValue,
    /// Whether the tracker considers the field changed in this unit of work
    pub modified: bool,
    /// Whether the field participates in the entity's primary key
    pub primary_key: bool,
    /// Storage-side generation policy
    pub generated: ValueGeneration,
    /// Current value is a placeholder pending storage assignment
    pub temporary: bool,
}

impl FieldState {
    /// New field snapshot with tracker defaults (unmodified, app-supplied value)
    pub fn new(name: impl Into<String>, current: JsonValue, original: JsonValue) -> Self {
        Self {
            name: name.into(),
            current,
            original,
            modified: false,
            primary_key: false,
            generated: ValueGeneration::Never,
            temporary: false,
        }
    }

    /// Whether this field's final value only exists after the primary write
    #[inline]
    pub fn is_deferred_for(&self, operation: Operation) -> bool {
        self.temporary || self.generated.applies_to(operation)
    }
}

/// One tracked entity about to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityChange {
    /// Tracker handle, valid until the unit of work completes
    pub token: EntryToken,
    /// Type name of the audited entity
    pub entity_type: String,
    /// What the commit will do with this entity
    pub operation: Operation,
    /// Entity carries the editable capability (created/updated stamps)
    pub editable: bool,
    /// Field snapshots in declaration order
    pub fields: Vec<FieldState>,
}

impl EntityChange {
    /// Whether the primary key spans more than one field
    pub fn has_composite_key(&self) -> bool {
        self.fields.iter().filter(|f| f.primary_key).count() > 1
    }

    /// The single primary-key field, when the key is not composite
    pub fn single_key_field(&self) -> Option<&FieldState> {
        let mut keys = self.fields.iter().filter(|f| f.primary_key);
        let first = keys.next()?;
        if keys.next().is_some() {
            return None;
        }
        Some(first)
    }
}
