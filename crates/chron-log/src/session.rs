//! The fluent, per-unit-of-work activity builder.
//!
//! A [`LoggingSession`] accumulates the pieces of one activity record and
//! writes it to an [`ActivityStore`] on [`LoggingSession::commit`]. A commit
//! clears everything except the batch id, so the same session can log the
//! next record straight away.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use chron_config::GeneralConfig;
use chron_core::ids::{PREFIX_ACTIVITY, generate_id};
use chron_core::{ActivityRecord, DEFAULT_LOG_NAME, EntityRef, Loggable, Properties, RecordHandle, value};

use crate::actor::ActorResolver;
use crate::changes::{ChangeRules, ChangeSet, Trackable};
use crate::error::StoreError;
use crate::store::ActivityStore;

/// Property key mirroring the active batch id.
pub const BATCH_PROPERTY: &str = "batch_uuid";

/// Property key holding an update's `{"old": …, "new": …}` diff.
pub const CHANGES_PROPERTY: &str = "changes";

/// Event whose records carry a diff.
const UPDATED: &str = "updated";

/// Who caused the pending record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CauserSlot {
    /// Not decided yet; resolved from the current actor on commit.
    #[default]
    Unset,
    /// Explicitly nobody. Actor resolution leaves it alone.
    Nobody,
    Actor(EntityRef),
}

impl CauserSlot {
    #[must_use]
    pub const fn actor(&self) -> Option<&EntityRef> {
        match self {
            Self::Actor(actor) => Some(actor),
            Self::Unset | Self::Nobody => None,
        }
    }
}

/// Where the session is in its build/commit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Accumulating,
    /// Last commit succeeded and nothing has been set since.
    Committed(RecordHandle),
}

/// Values a fresh or reset session starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub log_name: String,
    /// Guard for actor resolution; `None` means records default to no causer.
    pub auth_guard: Option<String>,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            log_name: DEFAULT_LOG_NAME.to_string(),
            auth_guard: Some("web".to_string()),
        }
    }
}

impl From<&GeneralConfig> for SessionDefaults {
    fn from(config: &GeneralConfig) -> Self {
        Self {
            log_name: config.default_log_name.clone(),
            auth_guard: config.auth_guard().map(str::to_string),
        }
    }
}

/// Builds and commits activity records.
///
/// Owned by one unit of work; not shared between tasks.
pub struct LoggingSession<'s, S> {
    store: &'s S,
    actors: &'s dyn ActorResolver,
    defaults: SessionDefaults,
    log_name: String,
    description: Option<String>,
    subject: Option<EntityRef>,
    causer: CauserSlot,
    properties: Properties,
    context: Properties,
    template: Option<String>,
    event: Option<String>,
    batch_id: Option<Uuid>,
    state: SessionState,
}

impl<'s, S: ActivityStore> LoggingSession<'s, S> {
    pub fn new(store: &'s S, actors: &'s dyn ActorResolver) -> Self {
        Self::with_defaults(store, actors, SessionDefaults::default())
    }

    pub fn with_defaults(
        store: &'s S,
        actors: &'s dyn ActorResolver,
        defaults: SessionDefaults,
    ) -> Self {
        Self {
            store,
            actors,
            log_name: defaults.log_name.clone(),
            defaults,
            description: None,
            subject: None,
            causer: CauserSlot::Unset,
            properties: Properties::new(),
            context: Properties::new(),
            template: None,
            event: None,
            batch_id: None,
            state: SessionState::Accumulating,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &'s S {
        self.store
    }

    // -- mutators --

    pub fn set_subject(&mut self, subject: EntityRef) -> &mut Self {
        self.touch();
        self.subject = Some(subject);
        self
    }

    pub fn performed_on(&mut self, entity: &(impl Loggable + ?Sized)) -> &mut Self {
        self.set_subject(entity.entity_ref())
    }

    /// `None` records explicitly that nobody caused the activity.
    pub fn set_causer(&mut self, causer: Option<EntityRef>) -> &mut Self {
        self.touch();
        self.causer = causer.map_or(CauserSlot::Nobody, CauserSlot::Actor);
        self
    }

    pub fn caused_by(&mut self, entity: &(impl Loggable + ?Sized)) -> &mut Self {
        self.set_causer(Some(entity.entity_ref()))
    }

    /// Shallow merge: top-level keys in `properties` replace existing ones.
    pub fn merge_properties(&mut self, properties: Properties) -> &mut Self {
        self.touch();
        self.properties.extend(properties);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.touch();
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Shallow merge into the request context.
    pub fn merge_context(&mut self, context: Properties) -> &mut Self {
        self.touch();
        self.context.extend(context);
        self
    }

    pub fn set_context_item(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.touch();
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn set_template(&mut self, template: impl Into<String>) -> &mut Self {
        self.touch();
        self.template = Some(template.into());
        self
    }

    pub fn set_event(&mut self, event: impl Into<String>) -> &mut Self {
        self.touch();
        self.event = Some(event.into());
        self
    }

    pub fn set_log_name(&mut self, log_name: impl Into<String>) -> &mut Self {
        self.touch();
        self.log_name = log_name.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.touch();
        self.description = Some(description.into());
        self
    }

    /// Run `f` against the session mid-chain.
    pub fn tap(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        f(self);
        self
    }

    // -- batches --

    /// Start tagging commits with a batch id. Generates one if none is given.
    pub fn start_batch(&mut self, batch_id: Option<Uuid>) -> Uuid {
        let id = batch_id.unwrap_or_else(Uuid::new_v4);
        self.batch_id = Some(id);
        self.set_property(BATCH_PROPERTY, id.to_string());
        tracing::debug!(batch = %id, "batch started");
        id
    }

    /// Stop tagging commits. The pending record loses its batch property too.
    pub fn end_batch(&mut self) -> &mut Self {
        if let Some(id) = self.batch_id.take() {
            self.properties.remove(BATCH_PROPERTY);
            tracing::debug!(batch = %id, "batch ended");
        }
        self
    }

    #[must_use]
    pub const fn batch_id(&self) -> Option<Uuid> {
        self.batch_id
    }

    // -- causer --

    /// Fill an unset causer from the actor resolver under the configured guard.
    ///
    /// A causer set explicitly (even to nobody) is left alone. Without a
    /// guard, the causer becomes nobody.
    pub fn resolve_causer_from_current_actor(&mut self) -> &mut Self {
        if self.causer != CauserSlot::Unset {
            return self;
        }
        let actor = self
            .defaults
            .auth_guard
            .as_deref()
            .and_then(|guard| self.actors.current_actor(guard));
        self.causer = actor.map_or(CauserSlot::Nobody, CauserSlot::Actor);
        self
    }

    // -- commit --

    /// Write exactly one record and reset for the next one.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged. The session keeps its pending
    /// fields, so the commit can be retried.
    pub async fn commit(&mut self) -> Result<&mut Self, StoreError> {
        self.resolve_causer_from_current_actor();
        let record = self.build_record();
        let handle = self.store.put(&record).await?;
        tracing::debug!(
            id = %handle.id,
            log_name = %record.log_name,
            event = record.event.as_deref().unwrap_or_default(),
            "activity committed"
        );
        self.reset(handle);
        Ok(self)
    }

    /// Log a lifecycle event for `entity`.
    ///
    /// For `updated`, attaches the filtered diff under `properties.changes`.
    /// An update with an empty diff commits nothing unless `rules.log_empty`;
    /// in that case the pending fields are left as they were.
    ///
    /// Returns the handle of the committed record, or `None` when skipped.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn commit_change_event<T: Trackable + ?Sized>(
        &mut self,
        entity: &T,
        event: &str,
        rules: &ChangeRules,
    ) -> Result<Option<RecordHandle>, StoreError> {
        if event == UPDATED {
            let changes = ChangeSet::compute(entity, rules);
            if changes.is_empty() {
                if !rules.log_empty {
                    tracing::trace!(entity = %entity.entity_ref(), "no tracked changes, skipping");
                    return Ok(None);
                }
            } else {
                self.set_property(CHANGES_PROPERTY, changes.to_old_new());
            }
        }

        if self.description.is_none() {
            let reference = entity.entity_ref();
            let name = entity
                .field_value("name")
                .filter(|v| !v.is_null())
                .map_or_else(|| entity.display_name(), |v| value::display(&v));
            self.set_description(format!(r#"{event} {} "{name}""#, reference.short_type()));
        }

        self.performed_on(entity).set_event(event);
        self.commit().await?;
        Ok(self.last_committed().cloned())
    }

    /// Drop every pending field except the batch id.
    ///
    /// For callers that give up on a failed commit instead of retrying it.
    pub fn discard(&mut self) -> &mut Self {
        self.clear_pending();
        self.state = SessionState::Accumulating;
        tracing::debug!("pending activity discarded");
        self
    }

    // -- inspection --

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle of the last commit, until the next mutation.
    #[must_use]
    pub const fn last_committed(&self) -> Option<&RecordHandle> {
        match &self.state {
            SessionState::Committed(handle) => Some(handle),
            SessionState::Accumulating => None,
        }
    }

    #[must_use]
    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub const fn subject(&self) -> Option<&EntityRef> {
        self.subject.as_ref()
    }

    #[must_use]
    pub const fn causer(&self) -> &CauserSlot {
        &self.causer
    }

    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    #[must_use]
    pub const fn context(&self) -> &Properties {
        &self.context
    }

    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    #[must_use]
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    // -- internals --

    fn touch(&mut self) {
        if matches!(self.state, SessionState::Committed(_)) {
            self.state = SessionState::Accumulating;
        }
    }

    fn build_record(&self) -> ActivityRecord {
        let mut properties = self.properties.clone();
        if let Some(id) = self.batch_id {
            properties.insert(BATCH_PROPERTY.to_string(), Value::String(id.to_string()));
        }

        ActivityRecord {
            id: generate_id(PREFIX_ACTIVITY),
            log_name: self.log_name.clone(),
            description: self
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| self.default_description()),
            subject: self.subject.clone(),
            causer: self.causer.actor().cloned(),
            event: self.event.clone(),
            properties,
            context: self.context.clone(),
            template: self.template.clone(),
            batch_id: self.batch_id,
            created_at: Utc::now(),
        }
    }

    fn default_description(&self) -> String {
        let subject_type = self.subject.as_ref().map(|s| s.short_type().to_lowercase());
        match (self.event.as_deref(), subject_type) {
            (Some(event), Some(kind)) => format!("{event} {kind}"),
            (Some(event), None) => event.to_string(),
            (None, Some(kind)) => format!("logged {kind}"),
            (None, None) => "logged activity".to_string(),
        }
    }

    fn reset(&mut self, handle: RecordHandle) {
        self.clear_pending();
        self.state = SessionState::Committed(handle);
    }

    fn clear_pending(&mut self) {
        self.log_name.clone_from(&self.defaults.log_name);
        self.description = None;
        self.subject = None;
        self.causer = CauserSlot::Unset;
        self.properties = Properties::new();
        self.context = Properties::new();
        self.template = None;
        self.event = None;
    }
}
