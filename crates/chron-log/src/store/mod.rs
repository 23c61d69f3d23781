//! Activity storage.
//!
//! [`ActivityStore`] is the persistence port a session commits to;
//! [`FieldAuditStore`] holds the per-field audit trail. Every backend
//! implements both and returns finder results newest first.

mod configured;
mod jsonl;
mod memory;
mod sqlite;

pub use configured::ConfiguredStore;
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Duration, Utc};

use chron_core::{ActivityRecord, EntityRef, FieldAuditEntry, RecordHandle};

use crate::error::StoreError;

/// Persistence port for activity records.
///
/// Used through generics; implementations need not be object safe.
#[allow(async_fn_in_trait)]
pub trait ActivityStore {
    /// Persist one record.
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError>;

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError>;

    /// Records caused by `causer`; `None` selects records without a causer.
    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError>;

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError>;

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError>;

    /// Delete records created more than `days` days ago. Returns how many went.
    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError>;
}

impl<S: ActivityStore + ?Sized> ActivityStore for &S {
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        (**self).put(record).await
    }

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        (**self).find_by_subject(subject).await
    }

    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        (**self).find_by_causer(causer).await
    }

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        (**self).find_by_log_name(log_name).await
    }

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        (**self).find_by_event(event).await
    }

    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError> {
        (**self).purge_older_than(days).await
    }
}

/// Persistence port for per-field audit entries.
#[allow(async_fn_in_trait)]
pub trait FieldAuditStore {
    /// Persist `entries` in order.
    async fn put_field_entries(&self, entries: &[FieldAuditEntry]) -> Result<(), StoreError>;

    /// Every entry for `subject`, latest `event_time` first.
    async fn field_history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError>;
}

impl<S: FieldAuditStore + ?Sized> FieldAuditStore for &S {
    async fn put_field_entries(&self, entries: &[FieldAuditEntry]) -> Result<(), StoreError> {
        (**self).put_field_entries(entries).await
    }

    async fn field_history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        (**self).field_history(subject).await
    }
}

/// Records created before this instant are purged.
pub(crate) fn purge_cutoff(days: u32) -> DateTime<Utc> {
    Utc::now() - Duration::days(i64::from(days))
}

/// Order records newest first. Among equal timestamps the later-stored wins.
pub(crate) fn newest_first(mut records: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
    records.reverse();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

/// Order audit entries by `event_time`, latest first; later-stored wins ties.
pub(crate) fn latest_events_first(mut entries: Vec<FieldAuditEntry>) -> Vec<FieldAuditEntry> {
    entries.reverse();
    entries.sort_by(|a, b| b.event_time.cmp(&a.event_time));
    entries
}

/// Row filter shared by the in-process backends.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Finder<'a> {
    Subject(&'a EntityRef),
    Causer(Option<&'a EntityRef>),
    LogName(&'a str),
    Event(&'a str),
}

impl Finder<'_> {
    pub(crate) fn matches(self, record: &ActivityRecord) -> bool {
        match self {
            Self::Subject(subject) => record.subject.as_ref() == Some(subject),
            Self::Causer(causer) => record.causer.as_ref() == causer,
            Self::LogName(log_name) => record.log_name == log_name,
            Self::Event(event) => record.event.as_deref() == Some(event),
        }
    }
}
