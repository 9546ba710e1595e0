//! Transient per-entity audit records, finalized after the primary write

mod record;

pub use record::{DeferredField, PendingAuditRecord};
