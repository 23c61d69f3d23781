//! Lifecycle hooks that turn entity mutations into activity records.

use std::collections::HashMap;

use uuid::Uuid;

use chron_config::EntityLogConfig;
use chron_core::LifecycleEvent;

use crate::changes::{ChangeRules, ChangeSet, DEFAULT_TIMESTAMP_FIELD, Trackable};
use crate::error::StoreError;
use crate::session::LoggingSession;
use crate::store::ActivityStore;

/// How one entity type opts in to automatic logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingOptions {
    pub events: Vec<String>,
    pub log_name: Option<String>,
    /// Fields to diff. Empty means the entity's fillable fields.
    pub attributes: Vec<String>,
    pub ignore: Vec<String>,
    pub only_dirty: bool,
    pub submit_empty: bool,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            events: LifecycleEvent::DEFAULT_TRACKED
                .iter()
                .map(|event| event.as_str().to_string())
                .collect(),
            log_name: None,
            attributes: Vec::new(),
            ignore: Vec::new(),
            only_dirty: true,
            submit_empty: false,
        }
    }
}

impl TrackingOptions {
    #[must_use]
    pub fn events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = events.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn log_name(mut self, log_name: impl Into<String>) -> Self {
        self.log_name = Some(log_name.into());
        self
    }

    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn ignore<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn only_dirty(mut self, only_dirty: bool) -> Self {
        self.only_dirty = only_dirty;
        self
    }

    #[must_use]
    pub const fn submit_empty(mut self, submit_empty: bool) -> Self {
        self.submit_empty = submit_empty;
        self
    }

    #[must_use]
    pub fn tracks(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }

    /// Diff rules for these options.
    #[must_use]
    pub fn change_rules(&self, timestamp_field: &str) -> ChangeRules {
        ChangeRules {
            timestamp_field: timestamp_field.to_string(),
            excluded: self.ignore.clone(),
            allow_list: self.attributes.clone(),
            only_dirty: self.only_dirty,
            log_empty: self.submit_empty,
        }
    }
}

impl From<&EntityLogConfig> for TrackingOptions {
    fn from(config: &EntityLogConfig) -> Self {
        Self {
            events: config.events.clone(),
            log_name: config.log_name.clone(),
            attributes: config.attributes.clone(),
            ignore: config.ignore.clone(),
            only_dirty: config.only_dirty,
            submit_empty: config.submit_empty,
        }
    }
}

/// Logs tracked entity types' lifecycle events through its own session.
///
/// Every hook returns `Ok(true)` when a record was committed and `Ok(false)`
/// when the event was filtered out.
pub struct MutationObserver<'s, S> {
    session: LoggingSession<'s, S>,
    tracked: HashMap<String, TrackingOptions>,
    timestamp_field: String,
}

impl<'s, S: ActivityStore> MutationObserver<'s, S> {
    pub fn new(session: LoggingSession<'s, S>) -> Self {
        Self {
            session,
            tracked: HashMap::new(),
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
        }
    }

    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// Opt `entity_type` in. Replaces any earlier options for the type.
    ///
    /// Lookups try the exact type name first, then ignore ASCII case, so
    /// lowercased keys from env-derived configuration still match.
    pub fn track(&mut self, entity_type: impl Into<String>, options: TrackingOptions) -> &mut Self {
        self.tracked.insert(entity_type.into(), options);
        self
    }

    #[must_use]
    pub fn is_tracked(&self, entity_type: &str) -> bool {
        self.options(entity_type).is_some()
    }

    #[must_use]
    pub fn options(&self, entity_type: &str) -> Option<&TrackingOptions> {
        options_for(&self.tracked, entity_type)
    }

    pub async fn created<T: Trackable + ?Sized>(&mut self, entity: &T) -> Result<bool, StoreError> {
        self.record(entity, LifecycleEvent::Created.as_str()).await
    }

    pub async fn updated<T: Trackable + ?Sized>(&mut self, entity: &T) -> Result<bool, StoreError> {
        self.record(entity, LifecycleEvent::Updated.as_str()).await
    }

    pub async fn deleted<T: Trackable + ?Sized>(&mut self, entity: &T) -> Result<bool, StoreError> {
        self.record(entity, LifecycleEvent::Deleted.as_str()).await
    }

    /// Log `event` for `entity` if its type and the event are tracked.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged. The failed record is discarded,
    /// so the next hook starts from a clean session.
    pub async fn record<T: Trackable + ?Sized>(
        &mut self,
        entity: &T,
        event: &str,
    ) -> Result<bool, StoreError> {
        let reference = entity.entity_ref();
        let Some(options) = options_for(&self.tracked, &reference.entity_type) else {
            tracing::trace!(entity = %reference, event, "entity type not tracked");
            return Ok(false);
        };
        if !options.tracks(event) {
            tracing::trace!(entity = %reference, event, "event not tracked");
            return Ok(false);
        }

        let rules = options.change_rules(&self.timestamp_field);
        if event == LifecycleEvent::Updated.as_str() {
            if options.only_dirty && !touches_tracked_field(entity, &rules) {
                tracing::trace!(entity = %reference, "no tracked field dirty");
                return Ok(false);
            }
            if !rules.log_empty && ChangeSet::compute(entity, &rules).is_empty() {
                tracing::trace!(entity = %reference, "empty change set");
                return Ok(false);
            }
        }

        if let Some(log_name) = &options.log_name {
            self.session.set_log_name(log_name.clone());
        }
        if let Some(description) = entity.activity_description(event) {
            self.session.set_description(description);
        }

        match self.session.commit_change_event(entity, event, &rules).await {
            Ok(committed) => Ok(committed.is_some()),
            Err(e) => {
                tracing::warn!(entity = %reference, event, "activity not recorded: {e}");
                self.session.discard();
                Err(e)
            }
        }
    }

    /// Tag every commit until [`Self::end_batch`] with one batch id.
    pub fn start_batch(&mut self, batch_id: Option<Uuid>) -> Uuid {
        self.session.start_batch(batch_id)
    }

    pub fn end_batch(&mut self) -> &mut Self {
        self.session.end_batch();
        self
    }

    #[must_use]
    pub const fn session(&self) -> &LoggingSession<'s, S> {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut LoggingSession<'s, S> {
        &mut self.session
    }
}

fn options_for<'a>(
    tracked: &'a HashMap<String, TrackingOptions>,
    entity_type: &str,
) -> Option<&'a TrackingOptions> {
    tracked.get(entity_type).or_else(|| {
        tracked
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(entity_type))
            .map(|(_, options)| options)
    })
}

/// Whether any non-excluded dirty field is tracked. No tracked list means any.
fn touches_tracked_field<T: Trackable + ?Sized>(entity: &T, rules: &ChangeRules) -> bool {
    let tracked = rules.tracked_fields(entity).unwrap_or_default();
    entity
        .dirty()
        .keys()
        .filter(|field| !rules.is_excluded(field))
        .any(|field| tracked.is_empty() || tracked.contains(field))
}
