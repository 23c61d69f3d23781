use anyhow::Context;

use chron_config::ChronicleConfig;
use chron_core::EntityRef;
use chron_log::{ActivityLog, ConfiguredStore};

use crate::cli::GlobalFlags;

/// Environment variable naming the acting entity as `Type:id`.
pub const ACTOR_ENV: &str = "CHRONICLE_ACTOR";

/// Everything a command handler needs.
pub struct AppContext {
    pub log: ActivityLog<ConfiguredStore>,
}

impl AppContext {
    pub async fn init(mut config: ChronicleConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        if let Some(store) = &flags.store {
            config.storage.path.clone_from(store);
        }

        let log = ActivityLog::<ConfiguredStore>::from_config(config, env_actor)
            .await
            .context("failed to open activity store")?;
        Ok(Self { log })
    }
}

/// The actor named by `CHRONICLE_ACTOR`, under any guard.
fn env_actor(_guard: &str) -> Option<EntityRef> {
    let raw = std::env::var(ACTOR_ENV).ok()?;
    match raw.parse() {
        Ok(actor) => Some(actor),
        Err(error) => {
            tracing::warn!(%error, "ignoring {ACTOR_ENV}");
            None
        }
    }
}

pub fn load_config() -> anyhow::Result<ChronicleConfig> {
    ChronicleConfig::load_with_dotenv().context("failed to load chronicle configuration")
}
