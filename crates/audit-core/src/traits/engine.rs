//! ChangeEngine port - the persistence-engine boundary
//!
//! The audit pipeline consumes an existing persistence engine through this
//! trait: enumerable change-tracked entities with field-level metadata, a
//! write operation for the staged unit of work, and transaction primitives.
//! The synchronous methods are in-memory tracker operations; the async
//! methods are the only points that touch storage.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::change::{EntityChange, EntryToken};
use crate::entities::AuditLog;
use crate::error::AuditResult;

/// Persistence engine exposing entity-level change tracking
#[async_trait]
pub trait ChangeEngine: Send + Sync {
    /// Snapshot every tracked entity in the pending unit of work
    ///
    /// Snapshots are plain data; taking one never touches storage.
    fn pending_changes(&self) -> Vec<EntityChange>;

    /// Overwrite a tracked entity's field before the primary write
    ///
    /// Used to stamp editable entities. On an entity tracked as Modified the
    /// engine marks the field changed, like any application write would.
    fn set_current_value(
        &self,
        token: EntryToken,
        field: &str,
        value: JsonValue,
    ) -> AuditResult<()>;

    /// Re-read field values from a tracked entry after the primary write
    ///
    /// Errors with a metadata inconsistency when a requested value is still
    /// a placeholder, i.e. the engine never assigned it.
    fn read_current_values(
        &self,
        token: EntryToken,
        fields: &[String],
    ) -> AuditResult<Vec<(String, JsonValue)>>;

    /// Stage audit rows for the next flush (append-only)
    fn stage_audit_logs(&self, logs: Vec<AuditLog>) -> AuditResult<()>;

    /// Whether a transaction is already open on the underlying connection
    fn in_transaction(&self) -> bool;

    /// Open a transaction on the underlying connection
    async fn begin_transaction(&self) -> AuditResult<()>;

    /// Commit the open transaction
    async fn commit_transaction(&self) -> AuditResult<()>;

    /// Roll back the open transaction
    async fn rollback_transaction(&self) -> AuditResult<()>;

    /// Write the staged unit of work
    ///
    /// Assigns generated keys and computed columns, clears tracking, and
    /// returns the number of business-entity rows written. Staged audit rows
    /// are written in the same call but never counted.
    async fn flush(&self) -> AuditResult<u64>;
}
