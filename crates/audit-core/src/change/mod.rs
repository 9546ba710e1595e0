//! Change-set snapshot types handed across the persistence-engine boundary

mod entity_change;

pub use entity_change::{EntityChange, EntryToken, FieldState};
