//! CommitOrchestrator - drives the audited commit
//!
//! Every commit goes through here; an unaudited save path is deliberately not
//! offered. When no pending record depends on storage-generated values, the
//! audit rows ride along with the primary write in a single flush. Otherwise
//! the commit runs in two phases inside one transaction: flush the business
//! entities, re-read the now-assigned values, then flush the finalized audit
//! rows. A transaction already opened by the caller is reused and never
//! committed or rolled back here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use audit_core::{
    editable, AuditError, AuditPolicy, AuditResult, ChangeEngine, PendingAuditRecord,
    MAX_ACTOR_LEN,
};

use crate::inspector::ChangeSetInspector;

/// Drives audited commits against a change-tracking persistence engine
pub struct CommitOrchestrator<E: ChangeEngine> {
    engine: Arc<E>,
    inspector: ChangeSetInspector,
}

impl<E: ChangeEngine> CommitOrchestrator<E> {
    /// Create an orchestrator over the given engine and exclusion policy
    pub fn new(engine: Arc<E>, policy: AuditPolicy) -> Self {
        Self {
            engine,
            inspector: ChangeSetInspector::new(policy),
        }
    }

    /// The underlying persistence engine
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Commit the pending unit of work with its audit trail, stamped now
    ///
    /// Returns the number of business-entity rows written.
    pub async fn save_changes(&self, actor: &str) -> AuditResult<u64> {
        self.commit(actor, Utc::now(), None).await
    }

    /// Commit with a caller-supplied timestamp
    pub async fn save_changes_at(
        &self,
        actor: &str,
        timestamp: DateTime<Utc>,
    ) -> AuditResult<u64> {
        self.commit(actor, timestamp, None).await
    }

    /// Commit, honoring a cancellation token at the write and transaction
    /// boundaries
    ///
    /// A cancellation observed between the two phases still rolls back a
    /// transaction this call opened; partial commits never escape.
    pub async fn save_changes_with_cancel(
        &self,
        actor: &str,
        timestamp: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> AuditResult<u64> {
        self.commit(actor, timestamp, Some(cancel)).await
    }

    #[instrument(skip(self, cancel, timestamp))]
    async fn commit(
        &self,
        actor: &str,
        timestamp: DateTime<Utc>,
        cancel: Option<&CancellationToken>,
    ) -> AuditResult<u64> {
        validate_actor(actor)?;

        self.stamp_editable_entities(actor, timestamp)?;

        let changes = self.engine.pending_changes();
        let records = self.inspector.inspect(&changes, actor, timestamp);
        let (deferred, immediate): (Vec<_>, Vec<_>) =
            records.into_iter().partition(PendingAuditRecord::has_deferred);

        if deferred.is_empty() {
            return self.single_phase(immediate, cancel).await;
        }
        self.two_phase(immediate, deferred, cancel).await
    }

    /// Set created/updated stamps on editable entities before the write
    fn stamp_editable_entities(&self, actor: &str, timestamp: DateTime<Utc>) -> AuditResult<()> {
        for change in self.engine.pending_changes() {
            if !change.editable {
                continue;
            }
            for (field, value) in editable::stamp_fields(change.operation, actor, timestamp) {
                self.engine.set_current_value(change.token, field, value)?;
            }
        }
        Ok(())
    }

    /// Fast path: audit rows ride along with the primary write
    async fn single_phase(
        &self,
        immediate: Vec<PendingAuditRecord>,
        cancel: Option<&CancellationToken>,
    ) -> AuditResult<u64> {
        check_cancelled(cancel)?;
        self.stage_records(immediate)?;
        self.engine.flush().await
    }

    /// Two-phase path: flush entities, resolve generated values, flush audit
    async fn two_phase(
        &self,
        immediate: Vec<PendingAuditRecord>,
        deferred: Vec<PendingAuditRecord>,
        cancel: Option<&CancellationToken>,
    ) -> AuditResult<u64> {
        let owns_transaction = !self.engine.in_transaction();
        if owns_transaction {
            check_cancelled(cancel)?;
            self.engine.begin_transaction().await?;
        }

        let mut result = self.two_phase_writes(immediate, deferred, cancel).await;

        if owns_transaction {
            if result.is_ok() {
                if let Err(err) = self.engine.commit_transaction().await {
                    if let Err(rollback_err) = self.engine.rollback_transaction().await {
                        warn!(error = %rollback_err, "rollback after failed commit also failed");
                    }
                    result = Err(err);
                }
            } else if let Err(rollback_err) = self.engine.rollback_transaction().await {
                warn!(error = %rollback_err, "rollback of audited commit failed");
            }
        }

        result
    }

    async fn two_phase_writes(
        &self,
        immediate: Vec<PendingAuditRecord>,
        mut deferred: Vec<PendingAuditRecord>,
        cancel: Option<&CancellationToken>,
    ) -> AuditResult<u64> {
        // Phase 1: business entities only; this assigns generated values.
        check_cancelled(cancel)?;
        let rows = self.engine.flush().await?;

        check_cancelled(cancel)?;
        for record in &mut deferred {
            let names = record.deferred_field_names();
            let resolved = self.engine.read_current_values(record.token, &names)?;
            record.apply_resolved(&resolved);
        }
        debug!(records = deferred.len(), "resolved deferred audit values");

        // Phase 2: audit rows only.
        self.stage_records(immediate)?;
        self.stage_records(deferred)?;
        check_cancelled(cancel)?;
        self.engine.flush().await?;

        Ok(rows)
    }

    fn stage_records(&self, records: Vec<PendingAuditRecord>) -> AuditResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let logs = records
            .into_iter()
            .map(PendingAuditRecord::into_audit_log)
            .collect::<AuditResult<Vec<_>>>()?;
        self.engine.stage_audit_logs(logs)
    }
}

/// Reject the unaudited commit path
fn validate_actor(actor: &str) -> AuditResult<()> {
    if actor.trim().is_empty() {
        return Err(AuditError::MissingActor);
    }
    if actor.len() > MAX_ACTOR_LEN {
        return Err(AuditError::ActorTooLong { max: MAX_ACTOR_LEN });
    }
    Ok(())
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> AuditResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(AuditError::Cancelled),
        _ => Ok(()),
    }
}
