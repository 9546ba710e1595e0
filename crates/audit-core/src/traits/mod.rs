//! Ports - interfaces the audit pipeline requires from its surroundings

mod engine;

pub use engine::ChangeEngine;
