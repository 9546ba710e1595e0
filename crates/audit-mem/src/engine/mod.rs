//! The in-memory change-tracking engine

mod memory_engine;

pub use memory_engine::MemoryEngine;
