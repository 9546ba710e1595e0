//! Audit layer errors

use thiserror::Error;

use crate::change::EntryToken;

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors surfaced by the audited commit pipeline
#[derive(Debug, Error)]
pub enum AuditError {
    // =========================================================================
    // Contract Violations
    // =========================================================================
    #[error("An actor identity is required for an audited commit")]
    MissingActor,

    #[error("Actor identity exceeds {max} characters")]
    ActorTooLong { max: usize },

    // =========================================================================
    // Persistence Failures
    // =========================================================================
    #[error("Persistence failure: {0}")]
    Persistence(String),

    // =========================================================================
    // Metadata Inconsistencies
    // =========================================================================
    #[error("Generated value for {entity_type}.{field} never materialized after the primary write")]
    UnresolvedField { entity_type: String, field: String },

    #[error("Change entry {0} is not tracked by the engine")]
    UnknownEntry(EntryToken),

    // =========================================================================
    // Cancellation
    // =========================================================================
    #[error("Commit cancelled before completion")]
    Cancelled,

    // =========================================================================
    // Internal Errors (wrapped)
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuditError {
    /// Get an error code string for logs and machine consumers
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingActor => "MISSING_ACTOR",
            Self::ActorTooLong { .. } => "ACTOR_TOO_LONG",
            Self::Persistence(_) => "PERSISTENCE_FAILURE",
            Self::UnresolvedField { .. } => "UNRESOLVED_FIELD",
            Self::UnknownEntry(_) => "UNKNOWN_ENTRY",
            Self::Cancelled => "CANCELLED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a caller contract violation (never retried)
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingActor | Self::ActorTooLong { .. })
    }

    /// Check if this is a mismatch between declared field metadata and
    /// actual engine behavior (fatal, never retried)
    pub fn is_metadata_inconsistency(&self) -> bool {
        matches!(self, Self::UnresolvedField { .. } | Self::UnknownEntry(_))
    }
}
