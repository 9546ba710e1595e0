//! Test helpers for integration tests
//!
//! Builds engine/orchestrator pairs over the in-memory engine and drives
//! the multi-commit lifecycle scenarios the suites assert against.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use audit_common::{try_init_tracing, TracingConfig};
use audit_core::{AuditLog, Operation};
use audit_engine::CommitOrchestrator;
use audit_mem::MemoryEngine;

use crate::fixtures::{
    customer_schema, fixed_timestamp, ignored_schema, note_schema, test_policy,
    versioned_schema, CREATOR, DELETER, UPDATER,
};

/// Engine with every test schema registered, plus its orchestrator
pub fn audited_engine() -> (Arc<MemoryEngine>, CommitOrchestrator<MemoryEngine>) {
    // A subscriber may already be installed by another test; that's fine
    let _ = try_init_tracing(&TracingConfig::default());

    let engine = Arc::new(
        MemoryEngine::new()
            .with_schema(customer_schema())
            .with_schema(ignored_schema())
            .with_schema(note_schema())
            .with_schema(versioned_schema()),
    );
    let orchestrator = CommitOrchestrator::new(Arc::clone(&engine), test_policy());
    (engine, orchestrator)
}

/// Run the three-commit customer lifecycle: created, renamed, deleted
///
/// Leaves three audit rows behind, one per operation, each stamped with the
/// fixed timestamp and its own actor.
pub async fn run_customer_lifecycle(
    engine: &Arc<MemoryEngine>,
    orchestrator: &CommitOrchestrator<MemoryEngine>,
) -> Result<()> {
    engine.insert(
        "Customer",
        [("name", json!("OldName")), ("secret", json!("OldSecret"))],
    )?;
    orchestrator.save_changes_at(CREATOR, fixed_timestamp()).await?;

    engine.update(
        "Customer",
        1,
        [("name", json!("NewName")), ("secret", json!("NewSecret"))],
    )?;
    orchestrator.save_changes_at(UPDATER, fixed_timestamp()).await?;

    engine.delete("Customer", 1)?;
    orchestrator.save_changes_at(DELETER, fixed_timestamp()).await?;

    Ok(())
}

/// The committed audit rows for one operation
pub fn logs_for(engine: &MemoryEngine, operation: Operation) -> Vec<AuditLog> {
    engine
        .audit_logs()
        .into_iter()
        .filter(|log| log.operation == operation)
        .collect()
}

/// The single committed audit row for one operation; panics otherwise
pub fn single_log(engine: &MemoryEngine, operation: Operation) -> AuditLog {
    let mut logs = logs_for(engine, operation);
    assert_eq!(logs.len(), 1, "expected exactly one {operation} audit row");
    logs.remove(0)
}
