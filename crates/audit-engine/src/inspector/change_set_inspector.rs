//! ChangeSetInspector - turns tracked entity changes into pending audit records
//!
//! Inspection is pure: it reads change snapshots and the exclusion policy and
//! produces one `PendingAuditRecord` per non-excluded entity. It never touches
//! storage and never mutates the tracker, so inspecting the same unmodified
//! change set twice yields structurally identical records.

use chrono::{DateTime, Utc};
use tracing::debug;

use audit_core::{
    AuditPolicy, DeferredField, EntityChange, FieldState, Operation, PendingAuditRecord,
};

/// Builds pending audit records from a change-set snapshot
#[derive(Debug, Clone)]
pub struct ChangeSetInspector {
    policy: AuditPolicy,
}

impl ChangeSetInspector {
    /// Create an inspector consulting the given exclusion policy
    pub fn new(policy: AuditPolicy) -> Self {
        Self { policy }
    }

    /// The exclusion policy this inspector consults
    pub fn policy(&self) -> &AuditPolicy {
        &self.policy
    }

    /// Produce one pending record per non-excluded tracked entity
    ///
    /// Records preserve field declaration order in their value snapshots.
    pub fn inspect(
        &self,
        changes: &[EntityChange],
        actor: &str,
        timestamp: DateTime<Utc>,
    ) -> Vec<PendingAuditRecord> {
        let records: Vec<PendingAuditRecord> = changes
            .iter()
            .filter(|change| !self.policy.is_entity_excluded(&change.entity_type))
            .map(|change| self.build_record(change, actor, timestamp))
            .collect();

        debug!(
            tracked = changes.len(),
            audited = records.len(),
            deferred = records.iter().filter(|r| r.has_deferred()).count(),
            "inspected change set"
        );

        records
    }

    fn build_record(
        &self,
        change: &EntityChange,
        actor: &str,
        timestamp: DateTime<Utc>,
    ) -> PendingAuditRecord {
        let mut record = PendingAuditRecord::new(
            change.token,
            actor,
            timestamp,
            change.entity_type.clone(),
            change.operation,
        );
        let composite_key = change.has_composite_key();

        for field in &change.fields {
            let excluded = self
                .policy
                .is_field_excluded(&change.entity_type, &field.name);
            if !excluded {
                capture_values(&mut record, change.operation, field);
                capture_change(&mut record, change.operation, field);
            }

            // Identity is captured separately from value snapshots: a key
            // excluded from the maps still identifies the audited row.
            let single_key = field.primary_key && !composite_key;
            if single_key {
                record.entity_id = field.current.as_i64();
            }

            if change.operation.captures_new_values()
                && field.is_deferred_for(change.operation)
                && (!excluded || single_key)
            {
                record.deferred.push(DeferredField {
                    name: field.name.clone(),
                    primary_key: single_key,
                    audited: !excluded,
                });
            }
        }

        record
    }
}

fn capture_values(record: &mut PendingAuditRecord, operation: Operation, field: &FieldState) {
    if operation.captures_old_values() {
        record
            .old_values
            .insert(field.name.clone(), field.original.clone());
    }
    if operation.captures_new_values() {
        record
            .new_values
            .insert(field.name.clone(), field.current.clone());
    }
}

fn capture_change(record: &mut PendingAuditRecord, operation: Operation, field: &FieldState) {
    if operation == Operation::Modified && field.modified {
        record.changed_fields.push(field.name.clone());
    }
}
