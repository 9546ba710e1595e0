//! AuditPolicy - statically declared exclusion table
//!
//! Built once at startup and consulted read-only afterwards. A whole entity
//! type can be excluded (no audit row is ever produced for it), or individual
//! fields can be excluded (their values never appear in any snapshot).

use std::collections::{HashMap, HashSet};

/// Exclusion table mapping entity types to their audit opt-outs
#[derive(Debug, Clone, Default)]
pub struct AuditPolicy {
    excluded_types: HashSet<String>,
    excluded_fields: HashMap<String, HashSet<String>>,
}

impl AuditPolicy {
    /// Empty policy: everything is audited
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude an entire entity type from auditing
    #[must_use]
    pub fn exclude_entity(mut self, entity_type: impl Into<String>) -> Self {
        self.excluded_types.insert(entity_type.into());
        self
    }

    /// Exclude a single field of an entity type from value capture
    #[must_use]
    pub fn exclude_field(
        mut self,
        entity_type: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.excluded_fields
            .entry(entity_type.into())
            .or_default()
            .insert(field.into());
        self
    }

    /// Whether the whole entity type is excluded from auditing
    pub fn is_entity_excluded(&self, entity_type: &str) -> bool {
        self.excluded_types.contains(entity_type)
    }

    /// Whether one field of an entity type is excluded from value capture
    pub fn is_field_excluded(&self, entity_type: &str, field: &str) -> bool {
        self.excluded_fields
            .get(entity_type)
            .is_some_and(|fields| fields.contains(field))
    }
}
