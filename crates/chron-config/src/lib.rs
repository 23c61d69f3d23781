//! # chron-config
//!
//! Layered configuration loading for Chronicle using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CHRONICLE_*` prefix, `__` as separator)
//! 2. Project-level `.chronicle/config.toml`
//! 3. User-level `~/.config/chronicle/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CHRONICLE_GENERAL__DEFAULT_LOG_NAME` -> `general.default_log_name`,
//! `CHRONICLE_STORAGE__DRIVER` -> `storage.driver`, etc.
//!
//! Env keys are lowercased, so `CHRONICLE_ENTITIES__ARTICLE__LOG_NAME` lands
//! in `entities.article`. Entity types are therefore looked up without regard
//! to case (see [`ChronicleConfig::entity`]). An env section does not merge
//! into a differently-cased TOML section; it sits beside it.
//!
//! # Usage
//!
//! ```no_run
//! use chron_config::ChronicleConfig;
//!
//! let config = ChronicleConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if let Some(article) = config.entity("Article") {
//!     println!("Article events: {:?}", article.events);
//! }
//! ```

mod entity;
mod error;
mod general;
mod queue;
mod storage;

pub use entity::EntityLogConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use queue::QueueConfig;
pub use storage::{StorageConfig, StorageDriver};

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChronicleConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Event -> template overrides, applied on top of the built-in defaults.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Tracking rules keyed by entity type name.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityLogConfig>,
}

impl ChronicleConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".chronicle/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CHRONICLE_").split("__"))
    }

    /// Check every section. Called once at startup; an invalid configuration
    /// never reaches a logging session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;
        self.storage.validate()?;
        if let Some(event) = self.templates.keys().find(|event| event.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "templates".into(),
                reason: format!("'{event}' is not an event name"),
            });
        }
        for (entity_type, entity) in &self.entities {
            entity.validate(entity_type)?;
        }
        Ok(())
    }

    /// Tracking rules for an entity type, if it is configured.
    ///
    /// An exact key wins; otherwise the first key equal ignoring ASCII case.
    #[must_use]
    pub fn entity(&self, entity_type: &str) -> Option<&EntityLogConfig> {
        self.entities.get(entity_type).or_else(|| {
            self.entities
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(entity_type))
                .map(|(_, entity)| entity)
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chronicle").join("config.toml"))
    }
}
