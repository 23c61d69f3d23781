//! In-process store.

use tokio::sync::Mutex;

use chron_core::{ActivityRecord, EntityRef, FieldAuditEntry, RecordHandle};

use super::{ActivityStore, FieldAuditStore, Finder, latest_events_first, newest_first, purge_cutoff};
use crate::error::StoreError;

/// Keeps records and field audit entries in memory, in commit order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ActivityRecord>>,
    field_entries: Mutex<Vec<FieldAuditEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, oldest first.
    pub async fn all(&self) -> Vec<ActivityRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Every field audit entry, oldest first.
    pub async fn all_field_entries(&self) -> Vec<FieldAuditEntry> {
        self.field_entries.lock().await.clone()
    }

    async fn find(&self, finder: Finder<'_>) -> Vec<ActivityRecord> {
        let records = self.records.lock().await;
        newest_first(
            records
                .iter()
                .filter(|record| finder.matches(record))
                .cloned()
                .collect(),
        )
    }
}

impl ActivityStore for MemoryStore {
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        self.records.lock().await.push(record.clone());
        tracing::debug!(id = %record.id, "stored activity in memory");
        Ok(record.handle())
    }

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        Ok(self.find(Finder::Subject(subject)).await)
    }

    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        Ok(self.find(Finder::Causer(causer)).await)
    }

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        Ok(self.find(Finder::LogName(log_name)).await)
    }

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        Ok(self.find(Finder::Event(event)).await)
    }

    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError> {
        let cutoff = purge_cutoff(days);
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.created_at >= cutoff);
        let purged = (before - records.len()) as u64;
        tracing::debug!(purged, days, "purged in-memory activity");
        Ok(purged)
    }
}

impl FieldAuditStore for MemoryStore {
    async fn put_field_entries(&self, entries: &[FieldAuditEntry]) -> Result<(), StoreError> {
        self.field_entries.lock().await.extend_from_slice(entries);
        tracing::debug!(entries = entries.len(), "stored field audit entries in memory");
        Ok(())
    }

    async fn field_history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        let entries = self.field_entries.lock().await;
        Ok(latest_events_first(
            entries
                .iter()
                .filter(|entry| &entry.subject == subject)
                .cloned()
                .collect(),
        ))
    }
}
