//! End-to-end audit trail scenarios through the in-memory engine

use integration_tests::{
    audited_engine, fixed_timestamp, run_customer_lifecycle, single_log, CREATOR, DELETER,
    UPDATER,
};

use audit_core::{ChangeEngine, Operation};
use serde_json::json;

#[tokio::test]
async fn lifecycle_produces_one_log_per_operation() {
    let (engine, orchestrator) = audited_engine();
    run_customer_lifecycle(&engine, &orchestrator).await.unwrap();

    let logs = engine.audit_logs();
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|log| log.entity_type == "Customer"));
    // Storage assigned the audit rows their own surrogate keys
    assert_eq!(logs.iter().map(|log| log.id).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[tokio::test]
async fn added_log_captures_new_values_and_generated_key() {
    let (engine, orchestrator) = audited_engine();
    run_customer_lifecycle(&engine, &orchestrator).await.unwrap();

    let log = single_log(&engine, Operation::Added);
    assert_eq!(log.actor, CREATOR);
    assert_eq!(log.timestamp, fixed_timestamp());
    assert_eq!(log.entity_id, Some(1));
    assert!(log.old_values.is_none());
    assert!(log.changed_fields.is_none());

    let new_values = log.new_values_map().unwrap();
    let keys: Vec<&String> = new_values.keys().collect();
    assert_eq!(
        keys,
        vec!["id", "name", "created_by", "created_on", "updated_by", "updated_on"]
    );
    // The storage-assigned key, not the tracker placeholder
    assert_eq!(new_values["id"], json!(1));
    assert_eq!(new_values["name"], json!("OldName"));
    assert_eq!(new_values["created_by"], json!(CREATOR));
    assert_eq!(new_values["updated_by"], json!(CREATOR));
    assert!(!new_values.contains_key("secret"));
}

#[tokio::test]
async fn modified_log_captures_both_snapshots_and_changed_fields() {
    let (engine, orchestrator) = audited_engine();
    run_customer_lifecycle(&engine, &orchestrator).await.unwrap();

    let log = single_log(&engine, Operation::Modified);
    assert_eq!(log.actor, UPDATER);
    assert_eq!(log.entity_id, Some(1));

    let old_values = log.old_values_map().unwrap();
    let new_values = log.new_values_map().unwrap();
    assert_eq!(old_values["name"], json!("OldName"));
    assert_eq!(new_values["name"], json!("NewName"));
    assert_eq!(old_values["updated_by"], json!(CREATOR));
    assert_eq!(new_values["updated_by"], json!(UPDATER));
    assert!(!old_values.contains_key("secret"));
    assert!(!new_values.contains_key("secret"));

    // The secret changed too, but an excluded field never shows up here
    assert_eq!(
        log.changed_field_names().unwrap(),
        vec!["name", "updated_by", "updated_on"]
    );
}

#[tokio::test]
async fn deleted_log_captures_old_values_only() {
    let (engine, orchestrator) = audited_engine();
    run_customer_lifecycle(&engine, &orchestrator).await.unwrap();

    let log = single_log(&engine, Operation::Deleted);
    assert_eq!(log.actor, DELETER);
    assert_eq!(log.entity_id, Some(1));
    assert!(log.new_values.is_none());
    assert!(log.changed_fields.is_none());

    let old_values = log.old_values_map().unwrap();
    assert_eq!(old_values["id"], json!(1));
    assert_eq!(old_values["name"], json!("NewName"));
    assert!(!old_values.contains_key("secret"));
}

#[tokio::test]
async fn editable_stamps_are_persisted_on_the_row() {
    let (engine, orchestrator) = audited_engine();

    engine
        .insert("Customer", [("name", json!("OldName"))])
        .unwrap();
    orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap();
    engine
        .update("Customer", 1, [("name", json!("NewName"))])
        .unwrap();
    orchestrator
        .save_changes_at(UPDATER, fixed_timestamp())
        .await
        .unwrap();

    let row = engine.get("Customer", 1).unwrap();
    assert_eq!(row["created_by"], json!(CREATOR));
    assert_eq!(row["updated_by"], json!(UPDATER));
    assert_eq!(row["created_on"], json!(fixed_timestamp().to_rfc3339()));
}

#[tokio::test]
async fn excluded_entity_type_is_written_but_not_audited() {
    let (engine, orchestrator) = audited_engine();

    engine
        .insert("Customer", [("name", json!("OldName"))])
        .unwrap();
    engine
        .insert("IgnoredEntity", [("name", json!("IgnoredEntity"))])
        .unwrap();
    let rows = orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap();

    assert_eq!(rows, 2);
    assert_eq!(engine.row_count("IgnoredEntity"), 1);
    let logs = engine.audit_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].entity_type, "Customer");
}

#[tokio::test]
async fn application_supplied_key_commits_in_a_single_flush() {
    let (engine, orchestrator) = audited_engine();

    engine
        .insert("Note", [("id", json!(5)), ("body", json!("hello"))])
        .unwrap();
    let rows = orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap();

    assert_eq!(rows, 1);
    // No record was deferred, so no transaction was needed
    assert!(!engine.in_transaction());

    let log = single_log(&engine, Operation::Added);
    assert_eq!(log.entity_id, Some(5));
    assert_eq!(log.new_values_map().unwrap()["body"], json!("hello"));
}

#[tokio::test]
async fn concurrency_token_resolves_after_update() {
    let (engine, orchestrator) = audited_engine();

    engine
        .insert("Document", [("title", json!("Draft"))])
        .unwrap();
    orchestrator
        .save_changes_at(CREATOR, fixed_timestamp())
        .await
        .unwrap();

    engine
        .update("Document", 1, [("title", json!("Final"))])
        .unwrap();
    orchestrator
        .save_changes_at(UPDATER, fixed_timestamp())
        .await
        .unwrap();

    let log = single_log(&engine, Operation::Modified);
    let old_values = log.old_values_map().unwrap();
    let new_values = log.new_values_map().unwrap();
    // The token's post-write value was re-read into the snapshot, but only
    // explicitly changed fields make the changed list
    assert_eq!(old_values["row_version"], json!(null));
    assert_eq!(new_values["row_version"], json!(1));
    assert_eq!(log.changed_field_names().unwrap(), vec!["title"]);
}
