//! Operation - the tracked state of an entity at commit time

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the pending commit is about to do with a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Added,
    Modified,
    Deleted,
}

impl Operation {
    /// Stable string form, matching how the operation is stored on audit rows
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
        }
    }

    /// Whether this operation snapshots pre-change field values
    #[inline]
    pub const fn captures_old_values(self) -> bool {
        matches!(self, Self::Modified | Self::Deleted)
    }

    /// Whether this operation snapshots post-change field values
    #[inline]
    pub const fn captures_new_values(self) -> bool {
        matches!(self, Self::Added | Self::Modified)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
