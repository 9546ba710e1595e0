//! Change-set inspection - building pending audit records

mod change_set_inspector;

pub use change_set_inspector::ChangeSetInspector;
