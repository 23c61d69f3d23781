//! Store selected by configuration.

use chron_config::{ConfigError, StorageConfig, StorageDriver};
use chron_core::{ActivityRecord, EntityRef, FieldAuditEntry, RecordHandle};

use super::{ActivityStore, FieldAuditStore, JsonlStore, MemoryStore, SqliteStore};
use crate::error::StoreError;

/// Whichever backend `[storage]` names.
pub enum ConfiguredStore {
    Memory(MemoryStore),
    Jsonl(JsonlStore),
    Sqlite(SqliteStore),
}

impl ConfiguredStore {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` when the driver needs a path and has none,
    /// or the backend's own error if it cannot be opened.
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        if !config.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: format!("storage ({} driver needs a path)", config.driver.as_str()),
            }
            .into());
        }

        tracing::debug!(driver = config.driver.as_str(), path = %config.path, "opening activity store");
        Ok(match config.driver {
            StorageDriver::Memory => Self::Memory(MemoryStore::new()),
            StorageDriver::Jsonl => Self::Jsonl(JsonlStore::new(&config.path)?),
            StorageDriver::Sqlite => Self::Sqlite(SqliteStore::open_local(&config.path).await?),
        })
    }

    #[must_use]
    pub const fn driver(&self) -> StorageDriver {
        match self {
            Self::Memory(_) => StorageDriver::Memory,
            Self::Jsonl(_) => StorageDriver::Jsonl,
            Self::Sqlite(_) => StorageDriver::Sqlite,
        }
    }
}

impl ActivityStore for ConfiguredStore {
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        match self {
            Self::Memory(store) => store.put(record).await,
            Self::Jsonl(store) => store.put(record).await,
            Self::Sqlite(store) => store.put(record).await,
        }
    }

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_subject(subject).await,
            Self::Jsonl(store) => store.find_by_subject(subject).await,
            Self::Sqlite(store) => store.find_by_subject(subject).await,
        }
    }

    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_causer(causer).await,
            Self::Jsonl(store) => store.find_by_causer(causer).await,
            Self::Sqlite(store) => store.find_by_causer(causer).await,
        }
    }

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_log_name(log_name).await,
            Self::Jsonl(store) => store.find_by_log_name(log_name).await,
            Self::Sqlite(store) => store.find_by_log_name(log_name).await,
        }
    }

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.find_by_event(event).await,
            Self::Jsonl(store) => store.find_by_event(event).await,
            Self::Sqlite(store) => store.find_by_event(event).await,
        }
    }

    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError> {
        match self {
            Self::Memory(store) => store.purge_older_than(days).await,
            Self::Jsonl(store) => store.purge_older_than(days).await,
            Self::Sqlite(store) => store.purge_older_than(days).await,
        }
    }
}

impl FieldAuditStore for ConfiguredStore {
    async fn put_field_entries(&self, entries: &[FieldAuditEntry]) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put_field_entries(entries).await,
            Self::Jsonl(store) => store.put_field_entries(entries).await,
            Self::Sqlite(store) => store.put_field_entries(entries).await,
        }
    }

    async fn field_history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        match self {
            Self::Memory(store) => store.field_history(subject).await,
            Self::Jsonl(store) => store.field_history(subject).await,
            Self::Sqlite(store) => store.field_history(subject).await,
        }
    }
}
