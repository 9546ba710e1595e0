//! # audit-common
//!
//! Shared utilities for embedding the audit pipeline: configuration and
//! telemetry setup.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{AppSettings, AuditConfig, AuditSettings, ConfigError, Environment};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
