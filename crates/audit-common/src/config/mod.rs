//! Configuration structs

mod audit_config;

pub use audit_config::{AppSettings, AuditConfig, AuditSettings, ConfigError, Environment};
