//! Queue dispatch settings.
//!
//! Chronicle persists synchronously; these values are carried so a host that
//! hands records to its own queue can read them from the same file.

use serde::{Deserialize, Serialize};

fn default_queue_name() -> String {
    String::from("default")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_queue_name")]
    pub name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: default_queue_name(),
        }
    }
}
