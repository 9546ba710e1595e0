//! EntitySchema - declared field order, key shape, and generation policies

use audit_core::{editable, ValueGeneration};

/// Static metadata for one field of a registered entity type
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub primary_key: bool,
    pub generated: ValueGeneration,
}

impl FieldSchema {
    /// Application-supplied, non-key field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: false,
            generated: ValueGeneration::Never,
        }
    }

    /// Mark the field as (part of) the primary key
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Set the storage-side generation policy
    #[must_use]
    pub fn generated(mut self, generated: ValueGeneration) -> Self {
        self.generated = generated;
        self
    }
}

/// Static metadata for one registered entity type
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub name: String,
    pub editable: bool,
    pub fields: Vec<FieldSchema>,
}

impl EntitySchema {
    /// New schema with no fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            editable: false,
            fields: Vec::new(),
        }
    }

    /// Append a field; declaration order is preserved in every snapshot
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Grant the editable capability, declaring the four stamp fields
    #[must_use]
    pub fn editable(mut self) -> Self {
        self.editable = true;
        for name in [
            editable::CREATED_BY,
            editable::CREATED_ON,
            editable::UPDATED_BY,
            editable::UPDATED_ON,
        ] {
            self.fields.push(FieldSchema::new(name));
        }
        self
    }

    /// The single primary-key field, when the key is not composite
    pub fn single_key(&self) -> Option<&FieldSchema> {
        let mut keys = self.fields.iter().filter(|f| f.primary_key);
        let first = keys.next()?;
        if keys.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Look up a field by name
    pub fn field_by_name(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}
