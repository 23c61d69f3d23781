//! Append-only JSON Lines store.
//!
//! One record per line, appended with `serde_jsonlines::append_json_lines`.
//! Finders scan the whole file; a purge rewrites it. Field audit entries go
//! to a sibling `<stem>.audit.jsonl` file.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use chron_core::{ActivityRecord, EntityRef, FieldAuditEntry, RecordHandle};

use super::{
    ActivityStore, FieldAuditStore, Finder, latest_events_first, newest_first, purge_cutoff,
};
use crate::error::StoreError;

/// Stores activity in a single `.jsonl` file.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
    audit_path: PathBuf,
}

impl JsonlStore {
    /// Create a store writing to `path`. Creates the parent directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let audit_path = path.with_extension("audit.jsonl");
        Ok(Self { path, audit_path })
    }

    /// The file records are appended to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file field audit entries are appended to.
    #[must_use]
    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }

    /// Every readable record, in file order. A missing file holds nothing;
    /// lines that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be opened.
    pub fn read_all(&self) -> Result<Vec<ActivityRecord>, StoreError> {
        read_lines(&self.path)
    }

    /// Every readable field audit entry, in file order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be opened.
    pub fn read_field_entries(&self) -> Result<Vec<FieldAuditEntry>, StoreError> {
        read_lines(&self.audit_path)
    }

    fn find(&self, finder: Finder<'_>) -> Result<Vec<ActivityRecord>, StoreError> {
        let matching = self
            .read_all()?
            .into_iter()
            .filter(|record| finder.matches(record))
            .collect();
        Ok(newest_first(matching))
    }
}

impl ActivityStore for JsonlStore {
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        serde_jsonlines::append_json_lines(&self.path, [record])?;
        tracing::debug!(id = %record.id, path = %self.path.display(), "appended activity");
        Ok(record.handle())
    }

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::Subject(subject))
    }

    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::Causer(causer))
    }

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::LogName(log_name))
    }

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::Event(event))
    }

    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError> {
        let cutoff = purge_cutoff(days);
        let records = self.read_all()?;
        let before = records.len();
        let kept: Vec<ActivityRecord> = records
            .into_iter()
            .filter(|record| record.created_at >= cutoff)
            .collect();
        let purged = (before - kept.len()) as u64;
        if purged > 0 {
            serde_jsonlines::write_json_lines(&self.path, &kept)?;
        }
        tracing::debug!(purged, days, path = %self.path.display(), "purged activity file");
        Ok(purged)
    }
}

impl FieldAuditStore for JsonlStore {
    async fn put_field_entries(&self, entries: &[FieldAuditEntry]) -> Result<(), StoreError> {
        serde_jsonlines::append_json_lines(&self.audit_path, entries)?;
        tracing::debug!(
            entries = entries.len(),
            path = %self.audit_path.display(),
            "appended field audit entries"
        );
        Ok(())
    }

    async fn field_history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        let matching = self
            .read_field_entries()?
            .into_iter()
            .filter(|entry| &entry.subject == subject)
            .collect();
        Ok(latest_events_first(matching))
    }
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    for (line, parsed) in serde_jsonlines::json_lines::<T, _>(path)?.enumerate() {
        match parsed {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(
                path = %path.display(),
                line = line + 1,
                "skipping unreadable line: {e}"
            ),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_at;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonlStore::new(dir.path().join("nested/activity.jsonl")).unwrap();
        assert!(store.read_all().unwrap().is_empty());
        assert!(store.find_by_event("created").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonlStore::new(dir.path().join("activity.jsonl")).unwrap();
        let now = Utc::now();
        store.put(&record_at("act-1", now - Duration::seconds(1))).await.unwrap();
        store.put(&record_at("act-2", now)).await.unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        let ids: Vec<_> = store
            .find_by_log_name("default")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["act-2", "act-1"]);
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonlStore::new(dir.path().join("activity.jsonl")).unwrap();
        store.put(&record_at("act-1", Utc::now())).await.unwrap();
        let mut content = std::fs::read_to_string(store.path()).unwrap();
        content.push_str("{not json\n");
        std::fs::write(store.path(), content).unwrap();
        store.put(&record_at("act-2", Utc::now())).await.unwrap();

        assert_eq!(store.read_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn purge_rewrites_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonlStore::new(dir.path().join("activity.jsonl")).unwrap();
        let now = Utc::now();
        store.put(&record_at("old", now - Duration::days(10))).await.unwrap();
        store.put(&record_at("new", now)).await.unwrap();

        assert_eq!(store.purge_older_than(7).await.unwrap(), 1);
        assert_eq!(store.purge_older_than(7).await.unwrap(), 0);
        let left = store.read_all().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "new");
    }

    #[tokio::test]
    async fn field_entries_live_in_sibling_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonlStore::new(dir.path().join("activity.jsonl")).unwrap();
        assert_eq!(store.audit_path(), dir.path().join("activity.audit.jsonl"));

        let article = EntityRef::new("Article", "1");
        let now = Utc::now();
        store
            .put_field_entries(&[
                FieldAuditEntry::new(article.clone(), "title", "A", "B").at(now - Duration::hours(1)),
                FieldAuditEntry::new(article.clone(), "status", "draft", "live").at(now),
            ])
            .await
            .unwrap();

        assert!(store.read_all().unwrap().is_empty());
        let fields: Vec<_> = store
            .field_history(&article)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, ["status", "title"]);
    }
}
