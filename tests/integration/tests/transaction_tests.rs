//! Transaction ownership, atomicity, and the blocking facade

use std::sync::Arc;

use integration_tests::{
    audited_engine, fixed_timestamp, run_customer_lifecycle, test_policy, CREATOR,
};

use audit_core::{AuditError, ChangeEngine};
use audit_mem::MemoryEngine;
use serde_json::json;

#[tokio::test]
async fn inherited_transaction_is_left_for_the_caller_to_commit() {
    let (engine, orchestrator) = audited_engine();

    engine.begin_transaction().await.unwrap();
    run_customer_lifecycle(&engine, &orchestrator).await.unwrap();

    // Three commits ran inside the caller's transaction; none closed it
    assert!(engine.in_transaction());
    engine.commit_transaction().await.unwrap();

    assert!(!engine.in_transaction());
    assert_eq!(engine.audit_logs().len(), 3);
}

#[tokio::test]
async fn inherited_transaction_rollback_discards_audited_commit() {
    let (engine, orchestrator) = audited_engine();

    engine.begin_transaction().await.unwrap();
    engine
        .insert("Customer", [("name", json!("OldName"))])
        .unwrap();
    orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap();

    assert!(engine.in_transaction());
    engine.rollback_transaction().await.unwrap();

    assert_eq!(engine.row_count("Customer"), 0);
    assert!(engine.audit_logs().is_empty());
}

#[tokio::test]
async fn audit_write_failure_rolls_back_the_business_write() {
    let (engine, orchestrator) = audited_engine();

    engine
        .insert("Customer", [("name", json!("OldName"))])
        .unwrap();
    // Phase 1 is the next flush; poison the audit flush after it
    engine.fail_on_flush(2);

    let err = orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Persistence(_)));

    // The entity inserted in phase 1 is not observable after the rollback
    assert_eq!(engine.row_count("Customer"), 0);
    assert!(engine.audit_logs().is_empty());
    assert!(!engine.in_transaction());
}

#[tokio::test]
async fn business_write_failure_leaves_no_audit_rows() {
    let (engine, orchestrator) = audited_engine();

    engine
        .insert("Customer", [("name", json!("OldName"))])
        .unwrap();
    engine.fail_on_flush(1);

    let err = orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Persistence(_)));

    assert_eq!(engine.row_count("Customer"), 0);
    assert!(engine.audit_logs().is_empty());
    assert!(!engine.in_transaction());
}

#[test]
fn blocking_facade_commits_with_identical_semantics() {
    let engine = Arc::new(
        MemoryEngine::new().with_schema(integration_tests::customer_schema()),
    );
    let orchestrator =
        audit_engine::blocking::CommitOrchestrator::new(Arc::clone(&engine), test_policy())
            .unwrap();

    engine
        .insert(
            "Customer",
            [("name", json!("OldName")), ("secret", json!("OldSecret"))],
        )
        .unwrap();
    let rows = orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .unwrap();

    assert_eq!(rows, 1);
    let logs = engine.audit_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].entity_id, Some(1));
    assert!(!logs[0].new_values_map().unwrap().contains_key("secret"));
}

#[test]
fn blocking_facade_rejects_the_unaudited_path() {
    let engine = Arc::new(
        MemoryEngine::new().with_schema(integration_tests::customer_schema()),
    );
    let orchestrator =
        audit_engine::blocking::CommitOrchestrator::new(engine, test_policy()).unwrap();

    let err = orchestrator.save_changes("").unwrap_err();
    assert!(matches!(err, AuditError::MissingActor));
}
