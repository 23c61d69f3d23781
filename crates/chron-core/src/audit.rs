//! Per-field audit trail entries.
//!
//! Alongside the activity log, a mutation can be recorded field by field:
//! one [`FieldAuditEntry`] per changed field, each with its old and new value.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityRef;
use crate::ids::{PREFIX_FIELD_AUDIT, generate_id};

/// One changed field of one entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FieldAuditEntry {
    pub id: String,
    pub subject: EntityRef,
    /// Who made the change; `None` for unattributed changes.
    pub causer: Option<EntityRef>,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub description: Option<String>,
    /// When the change happened. Defaults to when the entry was built.
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl FieldAuditEntry {
    #[must_use]
    pub fn new(
        subject: EntityRef,
        field: impl Into<String>,
        old_value: impl Into<Value>,
        new_value: impl Into<Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(PREFIX_FIELD_AUDIT),
            subject,
            causer: None,
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            description: None,
            event_time: now,
            created_at: now,
        }
    }

    #[must_use]
    pub fn with_causer(mut self, causer: Option<EntityRef>) -> Self {
        self.causer = causer;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn at(mut self, event_time: DateTime<Utc>) -> Self {
        self.event_time = event_time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_fills_defaults() {
        let entry = FieldAuditEntry::new(EntityRef::new("Article", "5"), "title", "A", "B");
        assert!(entry.id.starts_with("fau-"));
        assert_eq!(entry.causer, None);
        assert_eq!(entry.description, None);
        assert_eq!(entry.event_time, entry.created_at);
    }

    #[test]
    fn event_time_can_predate_creation() {
        let earlier = Utc::now() - Duration::hours(2);
        let entry = FieldAuditEntry::new(EntityRef::new("Article", "5"), "status", "draft", "live")
            .with_causer(Some(EntityRef::new("User", "1")))
            .with_description("import")
            .at(earlier);
        assert_eq!(entry.event_time, earlier);
        assert!(entry.created_at > earlier);
        assert_eq!(entry.description.as_deref(), Some("import"));
    }
}
