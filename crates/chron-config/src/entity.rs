//! Per-entity-type tracking configuration.

use chron_core::LifecycleEvent;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_events() -> Vec<String> {
    LifecycleEvent::DEFAULT_TRACKED
        .iter()
        .map(|event| event.as_str().to_string())
        .collect()
}

const fn default_true() -> bool {
    true
}

/// How one entity type is tracked (`[entities.Article]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntityLogConfig {
    /// Log name for this type's records. Falls back to the general default.
    #[serde(default)]
    pub log_name: Option<String>,

    /// Events that produce records.
    #[serde(default = "default_events")]
    pub events: Vec<String>,

    /// Allow-list of fields to diff. Empty means the entity's fillable fields.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Fields never diffed, in addition to the timestamp field.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Only log updates that touch a tracked field.
    #[serde(default = "default_true")]
    pub only_dirty: bool,

    /// Log updates even when the filtered diff is empty.
    #[serde(default)]
    pub submit_empty: bool,
}

impl Default for EntityLogConfig {
    fn default() -> Self {
        Self {
            log_name: None,
            events: default_events(),
            attributes: Vec::new(),
            ignore: Vec::new(),
            only_dirty: true,
            submit_empty: false,
        }
    }
}

impl EntityLogConfig {
    pub(crate) fn validate(&self, entity_type: &str) -> Result<(), ConfigError> {
        if let Some(event) = self.events.iter().find(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("entities.{entity_type}.events"),
                reason: format!("'{event}' is not an event name"),
            });
        }
        if self.log_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("entities.{entity_type}.log_name"),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
