//! Shared test utilities for chron-log unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use chron_core::{
    ActivityRecord, DEFAULT_LOG_NAME, EntityRef, FieldAuditEntry, Properties, RecordHandle,
};

use crate::error::StoreError;
use crate::store::{ActivityStore, FieldAuditStore, MemoryStore};

/// A bare record in the default log, created at `created_at`.
pub fn record_at(id: &str, created_at: DateTime<Utc>) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        log_name: DEFAULT_LOG_NAME.to_string(),
        description: format!("record {id}"),
        subject: None,
        causer: None,
        event: None,
        properties: Properties::new(),
        context: Properties::new(),
        template: None,
        batch_id: None,
        created_at,
    }
}

/// A store whose every call fails.
pub struct FailingStore;

impl ActivityStore for FailingStore {
    async fn put(&self, _record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }

    async fn find_by_subject(&self, _subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }

    async fn find_by_causer(
        &self,
        _causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }

    async fn find_by_log_name(&self, _log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }

    async fn find_by_event(&self, _event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }

    async fn purge_older_than(&self, _days: u32) -> Result<u64, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }
}

impl FieldAuditStore for FailingStore {
    async fn put_field_entries(&self, _entries: &[FieldAuditEntry]) -> Result<(), StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }

    async fn field_history(&self, _subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        Err(StoreError::Query("store unavailable".into()))
    }
}

/// A memory store whose first `n` writes fail.
pub struct FlakyStore {
    failures_left: AtomicUsize,
    inner: MemoryStore,
}

impl FlakyStore {
    pub fn failing_first(n: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(n),
            inner: MemoryStore::new(),
        }
    }

    pub const fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl ActivityStore for FlakyStore {
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Query("store unavailable".into()));
        }
        self.inner.put(record).await
    }

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        self.inner.find_by_subject(subject).await
    }

    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        self.inner.find_by_causer(causer).await
    }

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        self.inner.find_by_log_name(log_name).await
    }

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        self.inner.find_by_event(event).await
    }

    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError> {
        self.inner.purge_older_than(days).await
    }
}
