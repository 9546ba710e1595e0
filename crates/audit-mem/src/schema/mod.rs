//! Entity schemas - static metadata the engine tracks entities with

mod entity_schema;

pub use entity_schema::{EntitySchema, FieldSchema};
