//! # audit-engine
//!
//! The audit-capture pipeline: `ChangeSetInspector` turns a change-tracked
//! unit of work into pending audit records, and `CommitOrchestrator` drives
//! the audited commit — a single write when every record is complete, or a
//! two-phase write inside one transaction when storage-generated values must
//! be captured after the fact.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use audit_core::AuditPolicy;
//! use audit_engine::CommitOrchestrator;
//! use audit_mem::MemoryEngine;
//!
//! async fn example(engine: Arc<MemoryEngine>) -> audit_core::AuditResult<u64> {
//!     let policy = AuditPolicy::new().exclude_field("Customer", "secret");
//!     let orchestrator = CommitOrchestrator::new(engine, policy);
//!     orchestrator.save_changes("editor@example.com").await
//! }
//! ```

pub mod blocking;
pub mod inspector;
pub mod orchestrator;

// Re-export commonly used types
pub use inspector::ChangeSetInspector;
pub use orchestrator::CommitOrchestrator;
