//! Application configuration structs
//!
//! Loads configuration from environment variables, with a `.env` file
//! honored when present.

use serde::Deserialize;
use std::env;

use audit_core::MAX_ACTOR_LEN;

/// Main configuration for an embedding application
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    pub app: AppSettings,
    pub audit: AuditSettings,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Audit pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    /// Upper bound enforced on actor identities
    #[serde(default = "default_actor_max_len")]
    pub actor_max_len: usize,
    /// Name of the append-only audit table/collection
    #[serde(default = "default_audit_table")]
    pub audit_table: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            actor_max_len: default_actor_max_len(),
            audit_table: default_audit_table(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "audited-app".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_actor_max_len() -> usize {
    MAX_ACTOR_LEN
}

fn default_audit_table() -> String {
    "audit_logs".to_string()
}

impl AuditConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error when a variable holds an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            audit: AuditSettings {
                actor_max_len: match env::var("AUDIT_ACTOR_MAX_LEN") {
                    Ok(raw) => raw
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("AUDIT_ACTOR_MAX_LEN", raw))?,
                    Err(_) => default_actor_max_len(),
                },
                audit_table: env::var("AUDIT_TABLE").unwrap_or_else(|_| default_audit_table()),
            },
        })
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::default(),
            },
            audit: AuditSettings::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
