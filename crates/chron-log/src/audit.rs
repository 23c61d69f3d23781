//! Per-field audit trail.
//!
//! Where the activity log writes one record per mutation, the field audit
//! trail writes one [`FieldAuditEntry`] per changed field. Entries are
//! built either from an entity's pending mutation ([`FieldAuditTrail::log_model`])
//! or handed in ready-made ([`FieldAuditTrail::log`]).

use chrono::{DateTime, Utc};

use chron_core::{EntityRef, FieldAuditEntry};

use crate::actor::ActorResolver;
use crate::changes::{ChangeRules, ChangeSet, DEFAULT_TIMESTAMP_FIELD, Trackable};
use crate::error::StoreError;
use crate::store::FieldAuditStore;

/// Writes and reads per-field audit entries.
pub struct FieldAuditTrail<'s, S> {
    store: &'s S,
    actors: &'s dyn ActorResolver,
    auth_guard: Option<String>,
    timestamp_field: String,
}

impl<'s, S: FieldAuditStore> FieldAuditTrail<'s, S> {
    /// `auth_guard` of `None` leaves every generated entry unattributed.
    pub fn new(store: &'s S, actors: &'s dyn ActorResolver, auth_guard: Option<String>) -> Self {
        Self {
            store,
            actors,
            auth_guard,
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
        }
    }

    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// Write one prepared entry as given.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn log(&self, entry: FieldAuditEntry) -> Result<(), StoreError> {
        self.store.put_field_entries(std::slice::from_ref(&entry)).await?;
        tracing::debug!(subject = %entry.subject, field = %entry.field, "field audit entry written");
        Ok(())
    }

    /// Write one entry per changed field of `entity`'s pending mutation.
    ///
    /// Fields in [`Trackable::audit_excluded`] and the timestamp field are
    /// skipped, as are fields whose value did not actually change. The
    /// causer comes from the current actor. Returns the written entries;
    /// nothing is written when no field changed.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn log_model<T: Trackable + ?Sized>(
        &self,
        entity: &T,
        description: Option<&str>,
        event_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<FieldAuditEntry>, StoreError> {
        let subject = entity.entity_ref();
        let changes = ChangeSet::compute(entity, &self.rules(entity));
        if changes.is_empty() {
            tracing::trace!(entity = %subject, "no audited field changed");
            return Ok(Vec::new());
        }

        let causer = self.current_actor();
        let event_time = event_time.unwrap_or_else(Utc::now);
        let entries: Vec<FieldAuditEntry> = (&changes)
            .into_iter()
            .map(|change| {
                let entry = FieldAuditEntry::new(
                    subject.clone(),
                    change.field.clone(),
                    change.old.clone(),
                    change.new.clone(),
                )
                .with_causer(causer.clone())
                .at(event_time);
                match description {
                    Some(description) => entry.with_description(description),
                    None => entry,
                }
            })
            .collect();

        self.store.put_field_entries(&entries).await?;
        tracing::debug!(entity = %subject, fields = entries.len(), "field audit written");
        Ok(entries)
    }

    /// Every entry for `subject`, latest change first.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        self.store.field_history(subject).await
    }

    fn rules<T: Trackable + ?Sized>(&self, entity: &T) -> ChangeRules {
        ChangeRules {
            timestamp_field: self.timestamp_field.clone(),
            excluded: entity.audit_excluded(),
            allow_list: Vec::new(),
            only_dirty: false,
            log_empty: false,
        }
    }

    /// The actor new entries are attributed to, if any.
    pub fn current_actor(&self) -> Option<EntityRef> {
        self.auth_guard
            .as_deref()
            .and_then(|guard| self.actors.current_actor(guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{FixedActor, NoActor};
    use crate::changes::TrackedEntity;
    use crate::store::MemoryStore;
    use crate::test_support::FailingStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn article() -> TrackedEntity {
        TrackedEntity::new(EntityRef::new("Article", "5"))
            .with_attribute("title", "A")
            .with_attribute("status", "draft")
            .with_attribute("views", 0)
            .with_audit_excluded(["views"])
    }

    #[tokio::test]
    async fn log_model_writes_one_entry_per_field() {
        let store = MemoryStore::new();
        let actors = FixedActor(EntityRef::new("User", "1"));
        let trail = FieldAuditTrail::new(&store, &actors, Some("web".into()));

        let mut entity = article();
        entity
            .set("title", "B")
            .set("status", "live")
            .set("views", 3)
            .set("updated_at", "2026-10-16T00:00:00Z");
        let written = trail.log_model(&entity, Some("editor save"), None).await.unwrap();

        let fields: Vec<_> = written.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["title", "status"]);
        let stored = store.all_field_entries().await;
        assert_eq!(stored, written);
        assert_eq!(stored[0].old_value, "A");
        assert_eq!(stored[0].new_value, "B");
        assert_eq!(stored[1].causer, Some(EntityRef::new("User", "1")));
        assert_eq!(stored[1].description.as_deref(), Some("editor save"));
        assert_eq!(stored[0].event_time, stored[1].event_time);
    }

    #[tokio::test]
    async fn unchanged_entity_writes_nothing() {
        let store = MemoryStore::new();
        let trail = FieldAuditTrail::new(&store, &NoActor, Some("web".into()));

        let mut entity = article();
        entity.set("views", 8).set("title", "A");
        assert!(trail.log_model(&entity, None, None).await.unwrap().is_empty());
        assert!(store.all_field_entries().await.is_empty());
    }

    #[tokio::test]
    async fn custom_timestamp_field_is_excluded() {
        let store = MemoryStore::new();
        let trail = FieldAuditTrail::new(&store, &NoActor, None).with_timestamp_field("modified_at");

        let mut entity = article();
        entity.set("modified_at", "now").set("updated_at", "now");
        let written = trail.log_model(&entity, None, None).await.unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].field, "updated_at");
        assert_eq!(written[0].old_value, Value::Null);
    }

    #[tokio::test]
    async fn no_guard_leaves_entries_unattributed() {
        let store = MemoryStore::new();
        let actors = FixedActor(EntityRef::new("User", "1"));
        let trail = FieldAuditTrail::new(&store, &actors, None);

        let mut entity = article();
        entity.set("title", "B");
        let written = trail.log_model(&entity, None, None).await.unwrap();
        assert_eq!(written[0].causer, None);
    }

    #[tokio::test]
    async fn explicit_entry_keeps_its_fields() {
        let store = MemoryStore::new();
        let trail = FieldAuditTrail::new(&store, &NoActor, None);
        let yesterday = Utc::now() - Duration::days(1);

        trail
            .log(
                FieldAuditEntry::new(EntityRef::new("Invoice", "9"), "total", 10, 12)
                    .with_causer(Some(EntityRef::new("User", "4")))
                    .at(yesterday),
            )
            .await
            .unwrap();

        let history = trail.history(&EntityRef::new("Invoice", "9")).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_time, yesterday);
        assert_eq!(history[0].causer, Some(EntityRef::new("User", "4")));
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let trail = FieldAuditTrail::new(&FailingStore, &NoActor, None);
        let mut entity = article();
        entity.set("title", "B");
        let err = trail.log_model(&entity, None, None).await.err().unwrap();
        assert!(matches!(err, StoreError::Query(_)));
    }
}
