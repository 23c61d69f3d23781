//! libSQL-backed store.
//!
//! Uses the `libsql` crate's embedded local database. The schema lives in
//! `migrations/` and is applied on every open (`IF NOT EXISTS` throughout).

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::Builder;
use uuid::Uuid;

use chron_core::record::timestamp;
use serde_json::Value;

use chron_core::{ActivityRecord, EntityRef, FieldAuditEntry, Properties, RecordHandle};

use super::{ActivityStore, FieldAuditStore, Finder, purge_cutoff};
use crate::error::StoreError;

const MIGRATION_001: &str = include_str!("../../migrations/001_activity_log.sql");
const MIGRATION_002: &str = include_str!("../../migrations/002_field_audit.sql");

const COLUMNS: &str = "id, log_name, description, subject_type, subject_id, causer_type, \
                       causer_id, event, properties, context, template, batch_uuid, created_at";

const FIELD_AUDIT_COLUMNS: &str = "id, subject_type, subject_id, causer_type, causer_id, field, \
                                   old_value, new_value, description, event_time, created_at";

/// Activity records in a libSQL database.
pub struct SqliteStore {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl SqliteStore {
    /// Open (or create) a local database at `path`. `":memory:"` keeps it in memory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the database cannot be opened or the migration fails.
    pub async fn open_local(path: &str) -> Result<Self, StoreError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| StoreError::Migration(format!("001_activity_log: {e}")))?;
        self.conn
            .execute_batch(MIGRATION_002)
            .await
            .map_err(|e| StoreError::Migration(format!("002_field_audit: {e}")))?;
        Ok(())
    }

    async fn find(&self, finder: Finder<'_>) -> Result<Vec<ActivityRecord>, StoreError> {
        let mut params: Vec<libsql::Value> = Vec::new();
        let condition = match finder {
            Finder::Subject(subject) => {
                params.push(libsql::Value::Text(subject.entity_type.clone()));
                params.push(libsql::Value::Text(subject.entity_id.clone()));
                "subject_type = ?1 AND subject_id = ?2"
            }
            Finder::Causer(Some(causer)) => {
                params.push(libsql::Value::Text(causer.entity_type.clone()));
                params.push(libsql::Value::Text(causer.entity_id.clone()));
                "causer_type = ?1 AND causer_id = ?2"
            }
            Finder::Causer(None) => "causer_type IS NULL",
            Finder::LogName(log_name) => {
                params.push(libsql::Value::Text(log_name.to_string()));
                "log_name = ?1"
            }
            Finder::Event(event) => {
                params.push(libsql::Value::Text(event.to_string()));
                "event = ?1"
            }
        };

        let sql = format!(
            "SELECT {COLUMNS} FROM activity_log WHERE {condition}
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut rows = self
            .conn
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(record_from_row(&row)?);
        }
        Ok(records)
    }
}

impl ActivityStore for SqliteStore {
    async fn put(&self, record: &ActivityRecord) -> Result<RecordHandle, StoreError> {
        let properties = serde_json::to_string(&record.properties)?;
        let context = serde_json::to_string(&record.context)?;
        let batch_uuid = record.batch_id.map(|id| id.to_string());

        self.conn
            .execute(
                &format!(
                    "INSERT INTO activity_log ({COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                libsql::params![
                    record.id.as_str(),
                    record.log_name.as_str(),
                    record.description.as_str(),
                    record.subject.as_ref().map(|s| s.entity_type.as_str()),
                    record.subject.as_ref().map(|s| s.entity_id.as_str()),
                    record.causer.as_ref().map(|c| c.entity_type.as_str()),
                    record.causer.as_ref().map(|c| c.entity_id.as_str()),
                    record.event.as_deref(),
                    properties,
                    context,
                    record.template.as_deref(),
                    batch_uuid.as_deref(),
                    timestamp(&record.created_at)
                ],
            )
            .await?;

        tracing::debug!(id = %record.id, "inserted activity row");
        Ok(record.handle())
    }

    async fn find_by_subject(&self, subject: &EntityRef) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::Subject(subject)).await
    }

    async fn find_by_causer(
        &self,
        causer: Option<&EntityRef>,
    ) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::Causer(causer)).await
    }

    async fn find_by_log_name(&self, log_name: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::LogName(log_name)).await
    }

    async fn find_by_event(&self, event: &str) -> Result<Vec<ActivityRecord>, StoreError> {
        self.find(Finder::Event(event)).await
    }

    async fn purge_older_than(&self, days: u32) -> Result<u64, StoreError> {
        let cutoff = timestamp(&purge_cutoff(days));
        let purged = self
            .conn
            .execute(
                "DELETE FROM activity_log WHERE created_at < ?1",
                libsql::params![cutoff],
            )
            .await?;
        tracing::debug!(purged, days, "purged activity rows");
        Ok(purged)
    }
}

impl FieldAuditStore for SqliteStore {
    async fn put_field_entries(&self, entries: &[FieldAuditEntry]) -> Result<(), StoreError> {
        let tx = self.conn.transaction().await?;
        for entry in entries {
            tx.execute(
                &format!(
                    "INSERT INTO field_audit ({FIELD_AUDIT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                libsql::params![
                    entry.id.as_str(),
                    entry.subject.entity_type.as_str(),
                    entry.subject.entity_id.as_str(),
                    entry.causer.as_ref().map(|c| c.entity_type.as_str()),
                    entry.causer.as_ref().map(|c| c.entity_id.as_str()),
                    entry.field.as_str(),
                    serde_json::to_string(&entry.old_value)?,
                    serde_json::to_string(&entry.new_value)?,
                    entry.description.as_deref(),
                    timestamp(&entry.event_time),
                    timestamp(&entry.created_at)
                ],
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(entries = entries.len(), "inserted field audit rows");
        Ok(())
    }

    async fn field_history(&self, subject: &EntityRef) -> Result<Vec<FieldAuditEntry>, StoreError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {FIELD_AUDIT_COLUMNS} FROM field_audit
                     WHERE subject_type = ?1 AND subject_id = ?2
                     ORDER BY event_time DESC, rowid DESC"
                ),
                libsql::params![subject.entity_type.as_str(), subject.entity_id.as_str()],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(field_entry_from_row(&row)?);
        }
        Ok(entries)
    }
}

fn field_entry_from_row(row: &libsql::Row) -> Result<FieldAuditEntry, StoreError> {
    Ok(FieldAuditEntry {
        id: row.get::<String>(0)?,
        subject: EntityRef::new(row.get::<String>(1)?, row.get::<String>(2)?),
        causer: entity_ref(get_opt_string(row, 3)?, get_opt_string(row, 4)?),
        field: row.get::<String>(5)?,
        old_value: parse_value(&row.get::<String>(6)?)?,
        new_value: parse_value(&row.get::<String>(7)?)?,
        description: get_opt_string(row, 8)?,
        event_time: parse_datetime(&row.get::<String>(9)?)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

fn record_from_row(row: &libsql::Row) -> Result<ActivityRecord, StoreError> {
    Ok(ActivityRecord {
        id: row.get::<String>(0)?,
        log_name: row.get::<String>(1)?,
        description: row.get::<String>(2)?,
        subject: entity_ref(get_opt_string(row, 3)?, get_opt_string(row, 4)?),
        causer: entity_ref(get_opt_string(row, 5)?, get_opt_string(row, 6)?),
        event: get_opt_string(row, 7)?,
        properties: parse_map(&row.get::<String>(8)?)?,
        context: parse_map(&row.get::<String>(9)?)?,
        template: get_opt_string(row, 10)?,
        batch_id: get_opt_string(row, 11)?
            .map(|s| {
                Uuid::parse_str(&s)
                    .map_err(|e| StoreError::InvalidState(format!("Invalid batch uuid '{s}': {e}")))
            })
            .transpose()?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

fn entity_ref(entity_type: Option<String>, entity_id: Option<String>) -> Option<EntityRef> {
    Some(EntityRef::new(entity_type?, entity_id?))
}

/// Read a nullable TEXT column. An empty string stays `Some("")`.
fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, StoreError> {
    Ok(row.get::<Option<String>>(idx)?)
}

/// Parse a TEXT column as `DateTime<Utc>`, accepting RFC 3339 and `SQLite`'s
/// `datetime('now')` format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::InvalidState(format!("Failed to parse datetime '{s}': {e}")))
}

fn parse_value(s: &str) -> Result<Value, StoreError> {
    serde_json::from_str(s)
        .map_err(|e| StoreError::InvalidState(format!("Invalid JSON value in column: {e}")))
}

fn parse_map(s: &str) -> Result<Properties, StoreError> {
    if s.is_empty() {
        return Ok(Properties::new());
    }
    serde_json::from_str(s)
        .map_err(|e| StoreError::InvalidState(format!("Invalid JSON in column: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_at;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn test_store() -> SqliteStore {
        SqliteStore::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let store = test_store().await;
        let mut rows = store
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                ["activity_log"],
            )
            .await
            .unwrap();
        assert!(rows.next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn put_and_read_back_every_field() {
        let store = test_store().await;
        let mut record = record_at("act-0000000000000001", Utc::now());
        record.subject = Some(EntityRef::new("blog::Article", "5"));
        record.causer = Some(EntityRef::new("User", "1"));
        record.event = Some("updated".into());
        record.template = Some("{causer} did it".into());
        record.batch_id = Some(Uuid::new_v4());
        record
            .properties
            .insert("changes".into(), json!({"old": {"a": 1}, "new": {"a": 2}}));
        record.context.insert("ip".into(), json!("10.0.0.1"));
        store.put(&record).await.unwrap();

        let found = store
            .find_by_subject(&EntityRef::new("blog::Article", "5"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let back = &found[0];
        assert_eq!(back.id, record.id);
        assert_eq!(back.causer, record.causer);
        assert_eq!(back.properties, record.properties);
        assert_eq!(back.context, record.context);
        assert_eq!(back.batch_id, record.batch_id);
        assert_eq!(back.template, record.template);
        assert_eq!(back.created_at.timestamp_micros(), record.created_at.timestamp_micros());
    }

    #[tokio::test]
    async fn finders_order_newest_first() {
        let store = test_store().await;
        let now = Utc::now();
        let mut older = record_at("act-1", now - Duration::minutes(1));
        older.event = Some("login".into());
        let mut newer = record_at("act-2", now);
        newer.event = Some("login".into());
        newer.causer = Some(EntityRef::new("User", "3"));
        store.put(&older).await.unwrap();
        store.put(&newer).await.unwrap();

        let ids: Vec<_> = store
            .find_by_event("login")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["act-2", "act-1"]);

        let anonymous = store.find_by_causer(None).await.unwrap();
        assert_eq!(anonymous.len(), 1);
        assert_eq!(anonymous[0].id, "act-1");
        let by_user = store
            .find_by_causer(Some(&EntityRef::new("User", "3")))
            .await
            .unwrap();
        assert_eq!(by_user[0].id, "act-2");
    }

    #[tokio::test]
    async fn purge_deletes_old_rows() {
        let store = test_store().await;
        let now = Utc::now();
        store.put(&record_at("old", now - Duration::days(100))).await.unwrap();
        store.put(&record_at("new", now)).await.unwrap();

        assert_eq!(store.purge_older_than(90).await.unwrap(), 1);
        let left = store.find_by_log_name("default").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "new");
    }

    #[tokio::test]
    async fn empty_strings_survive_round_trip() {
        let store = test_store().await;
        let mut record = record_at("act-3", Utc::now());
        record.event = Some(String::new());
        record.template = Some(String::new());
        store.put(&record).await.unwrap();

        let back = &store.find_by_log_name("default").await.unwrap()[0];
        assert_eq!(back.event.as_deref(), Some(""));
        assert_eq!(back.template.as_deref(), Some(""));
        assert_eq!(back.batch_id, None);
    }

    #[tokio::test]
    async fn corrupt_rows_are_invalid_state() {
        let store = test_store().await;
        store.put(&record_at("act-4", Utc::now())).await.unwrap();
        store
            .conn()
            .execute("UPDATE activity_log SET properties = '{oops'", ())
            .await
            .unwrap();

        let err = store.find_by_log_name("default").await.err().unwrap();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn field_entries_round_trip() {
        let store = test_store().await;
        let article = EntityRef::new("blog::Article", "5");
        let now = Utc::now();
        let older = FieldAuditEntry::new(article.clone(), "title", "A", "B")
            .with_causer(Some(EntityRef::new("User", "1")))
            .at(now - Duration::minutes(5));
        let newer = FieldAuditEntry::new(article.clone(), "meta", json!({"lang": "en"}), Value::Null)
            .with_description("cleanup")
            .at(now);
        store.put_field_entries(&[older.clone(), newer.clone()]).await.unwrap();

        let history = store.field_history(&article).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, newer.id);
        assert_eq!(history[0].old_value, json!({"lang": "en"}));
        assert_eq!(history[0].new_value, Value::Null);
        assert_eq!(history[0].description.as_deref(), Some("cleanup"));
        assert_eq!(history[1].causer, older.causer);
        assert_eq!(history[1].new_value, "B");
        assert!(store
            .field_history(&EntityRef::new("blog::Article", "6"))
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn parse_datetime_accepts_sqlite_format() {
        let dt = parse_datetime("2026-02-09 14:30:00").unwrap();
        assert_eq!(timestamp(&dt), "2026-02-09T14:30:00.000000Z");
        assert!(matches!(parse_datetime("yesterday"), Err(StoreError::InvalidState(_))));
    }
}
