//! ValueGeneration - when the storage engine supplies a field's value itself

use serde::{Deserialize, Serialize};

use super::Operation;

/// Storage-side value generation policy for a single field
///
/// Populated by the persistence-engine adapter from its schema metadata.
/// A field whose policy applies to the current operation cannot be audited
/// from the in-memory state alone: its final value exists only after the
/// primary write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueGeneration {
    /// The application supplies the value
    #[default]
    Never,
    /// Generated when the row is inserted (identity columns, insert defaults)
    OnAdd,
    /// Recomputed when the row is updated (computed columns)
    OnUpdate,
    /// May be regenerated on update (concurrency tokens)
    OnUpdateSometimes,
}

impl ValueGeneration {
    /// Whether the engine will (re)generate the value for this operation
    #[inline]
    pub const fn applies_to(self, operation: Operation) -> bool {
        match self {
            Self::Never => false,
            Self::OnAdd => matches!(operation, Operation::Added),
            Self::OnUpdate | Self::OnUpdateSometimes => {
                matches!(operation, Operation::Modified)
            }
        }
    }
}
