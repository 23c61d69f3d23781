//! Process-wide entry point tying configuration, store, actor resolution
//! and rendering together.
//!
//! Built once at startup. Configuration is validated here, so a session or
//! observer handed out by [`ActivityLog`] never sees invalid settings.

use chron_config::{ChronicleConfig, ConfigError};
use chron_core::{ActivityRecord, EntityResolver};

use crate::actor::ActorResolver;
use crate::audit::FieldAuditTrail;
use crate::error::StoreError;
use crate::observer::{MutationObserver, TrackingOptions};
use crate::session::{LoggingSession, SessionDefaults};
use crate::store::{ActivityStore, ConfiguredStore, FieldAuditStore};
use crate::template::{ActivityPresenter, TemplateEngine};

/// Owns the store, the actor resolver and the template engine.
pub struct ActivityLog<S> {
    config: ChronicleConfig,
    store: S,
    actors: Box<dyn ActorResolver>,
    engine: TemplateEngine,
}

impl<S: ActivityStore> ActivityLog<S> {
    /// Validate `config` and register its template overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any section is invalid.
    pub fn new(
        config: ChronicleConfig,
        store: S,
        actors: impl ActorResolver + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.queue.enabled {
            tracing::warn!(
                queue = %config.queue.name,
                "queued dispatch is not available; records are persisted on commit"
            );
        }
        let mut engine = TemplateEngine::new();
        for (event, template) in &config.templates {
            engine.register(event.clone(), template.clone());
        }
        tracing::debug!(
            templates = config.templates.len(),
            entities = config.entities.len(),
            "activity log ready"
        );
        Ok(Self {
            config,
            store,
            actors: Box::new(actors),
            engine,
        })
    }

    /// A fresh session using the configured defaults.
    pub fn session(&self) -> LoggingSession<'_, S> {
        LoggingSession::with_defaults(
            &self.store,
            self.actors.as_ref(),
            SessionDefaults::from(&self.config.general),
        )
    }

    /// An observer tracking every `[entities.*]` section.
    pub fn observer(&self) -> MutationObserver<'_, S> {
        let mut observer = MutationObserver::new(self.session())
            .with_timestamp_field(self.config.general.timestamp_field.clone());
        for (entity_type, entity) in &self.config.entities {
            observer.track(entity_type.clone(), TrackingOptions::from(entity));
        }
        observer
    }

    /// Render a stored record's description.
    #[must_use]
    pub fn render(&self, record: &ActivityRecord, entities: &dyn EntityResolver) -> String {
        self.engine.render(record, entities, None)
    }

    pub fn present<'a>(
        &'a self,
        record: &'a ActivityRecord,
        entities: &'a dyn EntityResolver,
    ) -> ActivityPresenter<'a> {
        ActivityPresenter::new(record, &self.engine, entities)
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Register more templates after startup.
    pub const fn engine_mut(&mut self) -> &mut TemplateEngine {
        &mut self.engine
    }

    #[must_use]
    pub const fn config(&self) -> &ChronicleConfig {
        &self.config
    }
}

impl<S: FieldAuditStore> ActivityLog<S> {
    /// The per-field audit trail, sharing this log's store, actor resolver,
    /// auth guard and timestamp field.
    pub fn field_audit(&self) -> FieldAuditTrail<'_, S> {
        FieldAuditTrail::new(
            &self.store,
            self.actors.as_ref(),
            self.config.general.auth_guard().map(str::to_string),
        )
        .with_timestamp_field(self.config.general.timestamp_field.clone())
    }
}

impl ActivityLog<ConfiguredStore> {
    /// Validate `config` and open the store its `[storage]` section names.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` for invalid configuration, or the
    /// backend's error if the store cannot be opened.
    pub async fn from_config(
        config: ChronicleConfig,
        actors: impl ActorResolver + 'static,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        let store = ConfiguredStore::open(&config.storage).await?;
        Ok(Self::new(config, store, actors)?)
    }
}
