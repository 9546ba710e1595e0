//! Value objects - immutable types that represent audit domain concepts

mod generation;
mod operation;

pub use generation::ValueGeneration;
pub use operation::Operation;
