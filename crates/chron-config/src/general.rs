//! General logging defaults.

use chron_core::DEFAULT_LOG_NAME;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Guard value that disables actor resolution.
const GUARD_DISABLED: &str = "none";

fn default_log_name() -> String {
    String::from(DEFAULT_LOG_NAME)
}

#[allow(clippy::unnecessary_wraps)]
fn default_auth_guard() -> Option<String> {
    Some(String::from("web"))
}

fn default_timestamp_field() -> String {
    String::from("updated_at")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Log name used when a session does not choose one.
    #[serde(default = "default_log_name")]
    pub default_log_name: String,

    /// Guard handed to the actor resolver. `"none"` disables resolution,
    /// which attributes records to no actor.
    #[serde(default = "default_auth_guard")]
    pub default_auth_guard: Option<String>,

    /// Entity field holding the last-modified timestamp. Never part of a diff.
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_log_name: default_log_name(),
            default_auth_guard: default_auth_guard(),
            timestamp_field: default_timestamp_field(),
        }
    }
}

impl GeneralConfig {
    /// The guard to resolve actors under, or `None` when disabled.
    #[must_use]
    pub fn auth_guard(&self) -> Option<&str> {
        self.default_auth_guard
            .as_deref()
            .filter(|guard| !guard.eq_ignore_ascii_case(GUARD_DISABLED))
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.default_log_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.default_log_name".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(guard) = &self.default_auth_guard {
            if guard.trim().is_empty() || guard.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    field: "general.default_auth_guard".into(),
                    reason: format!("'{guard}' is not a guard name (use \"none\" to disable)"),
                });
            }
        }
        if self.timestamp_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.timestamp_field".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
