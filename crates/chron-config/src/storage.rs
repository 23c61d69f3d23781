//! Activity store selection.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which backend persists activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageDriver {
    /// Process-local, lost on exit. Useful for tests.
    Memory,
    /// One JSON record per line in a single file.
    Jsonl,
    /// Embedded libSQL database file.
    Sqlite,
}

impl StorageDriver {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Jsonl => "jsonl",
            Self::Sqlite => "sqlite",
        }
    }

    /// Whether the driver persists to `path`.
    #[must_use]
    pub const fn needs_path(self) -> bool {
        !matches!(self, Self::Memory)
    }
}

const fn default_driver() -> StorageDriver {
    StorageDriver::Sqlite
}

fn default_path() -> String {
    String::from(".chronicle/activity.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_driver")]
    pub driver: StorageDriver,

    /// Database or JSONL file path. Ignored by the memory driver.
    #[serde(default = "default_path")]
    pub path: String,

    /// Days of history kept by `chron purge` when no `--days` is given.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            path: default_path(),
            retention_days: None,
        }
    }
}

impl StorageConfig {
    /// Check if the selected driver has what it needs to open.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.driver.needs_path() || !self.path.trim().is_empty()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: format!("storage ({} driver needs a path)", self.driver.as_str()),
            });
        }
        if self.retention_days == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "storage.retention_days".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
