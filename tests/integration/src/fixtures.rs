//! Test entity schemas and shared scenario data

use chrono::{DateTime, TimeZone, Utc};

use audit_core::{AuditPolicy, ValueGeneration};
use audit_mem::{EntitySchema, FieldSchema};

/// Editable entity with a storage-assigned key and an unaudited secret field
pub fn customer_schema() -> EntitySchema {
    EntitySchema::new("Customer")
        .field(
            FieldSchema::new("id")
                .primary_key()
                .generated(ValueGeneration::OnAdd),
        )
        .field(FieldSchema::new("name"))
        .field(FieldSchema::new("secret"))
        .editable()
}

/// Entity type excluded from auditing altogether
pub fn ignored_schema() -> EntitySchema {
    EntitySchema::new("IgnoredEntity")
        .field(
            FieldSchema::new("id")
                .primary_key()
                .generated(ValueGeneration::OnAdd),
        )
        .field(FieldSchema::new("name"))
}

/// Entity with an application-supplied key and no generated fields
pub fn note_schema() -> EntitySchema {
    EntitySchema::new("Note")
        .field(FieldSchema::new("id").primary_key())
        .field(FieldSchema::new("body"))
}

/// Entity carrying a storage-maintained concurrency token
pub fn versioned_schema() -> EntitySchema {
    EntitySchema::new("Document")
        .field(
            FieldSchema::new("id")
                .primary_key()
                .generated(ValueGeneration::OnAdd),
        )
        .field(FieldSchema::new("title"))
        .field(FieldSchema::new("row_version").generated(ValueGeneration::OnUpdate))
}

/// Exclusion policy used across scenarios: the customer's secret never shows
/// up, and the ignored type produces no records at all
pub fn test_policy() -> AuditPolicy {
    AuditPolicy::new()
        .exclude_field("Customer", "secret")
        .exclude_entity("IgnoredEntity")
}

/// Actors used by the lifecycle scenarios
pub const CREATOR: &str = "creator@test.com";
pub const UPDATER: &str = "updater@test.com";
pub const DELETER: &str = "deleter@test.com";

/// Fixed commit timestamp for deterministic assertions
pub fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}
