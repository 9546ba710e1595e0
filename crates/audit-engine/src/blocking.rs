//! Blocking facade over the audited commit
//!
//! Same semantics as the async orchestrator, driven on a private
//! current-thread runtime. The calling thread is occupied for the duration
//! of the commit. Must not be used from inside an async runtime.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use audit_core::{AuditError, AuditPolicy, AuditResult, ChangeEngine};

/// Blocking counterpart of [`crate::CommitOrchestrator`]
pub struct CommitOrchestrator<E: ChangeEngine> {
    inner: crate::orchestrator::CommitOrchestrator<E>,
    runtime: tokio::runtime::Runtime,
}

impl<E: ChangeEngine> CommitOrchestrator<E> {
    /// Create a blocking orchestrator over the given engine and policy
    pub fn new(engine: Arc<E>, policy: AuditPolicy) -> AuditResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AuditError::Internal(e.to_string()))?;

        Ok(Self {
            inner: crate::orchestrator::CommitOrchestrator::new(engine, policy),
            runtime,
        })
    }

    /// The underlying persistence engine
    pub fn engine(&self) -> &Arc<E> {
        self.inner.engine()
    }

    /// Commit the pending unit of work with its audit trail, stamped now
    pub fn save_changes(&self, actor: &str) -> AuditResult<u64> {
        self.runtime.block_on(self.inner.save_changes(actor))
    }

    /// Commit with a caller-supplied timestamp
    pub fn save_changes_at(&self, actor: &str, timestamp: DateTime<Utc>) -> AuditResult<u64> {
        self.runtime
            .block_on(self.inner.save_changes_at(actor, timestamp))
    }
}
