//! The persisted activity record.
//!
//! An [`ActivityRecord`] is written once by a session and never mutated.
//! Update diffs live under `properties.changes` as `{"old": {..}, "new": {..}}`.

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::entity::EntityRef;
use crate::value;

/// Log name used when none is configured or set.
pub const DEFAULT_LOG_NAME: &str = "default";

/// Ordered string-keyed map used for properties and context.
pub type Properties = Map<String, Value>;

/// An immutable activity log entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ActivityRecord {
    pub id: String,
    pub log_name: String,
    pub description: String,
    pub subject: Option<EntityRef>,
    /// `None` when the action was explicitly attributed to no actor.
    pub causer: Option<EntityRef>,
    pub event: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub context: Properties,
    pub template: Option<String>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Receipt returned by a store after a record was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordHandle {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// The `changes` property attached to update records.
    #[must_use]
    pub fn changes(&self) -> Option<&Properties> {
        self.properties.get("changes").and_then(Value::as_object)
    }

    /// Pre-mutation values of the changed fields.
    #[must_use]
    pub fn old_attributes(&self) -> Option<&Properties> {
        self.changes()
            .and_then(|c| c.get("old"))
            .and_then(Value::as_object)
    }

    /// Post-mutation values of the changed fields.
    #[must_use]
    pub fn new_attributes(&self) -> Option<&Properties> {
        self.changes()
            .and_then(|c| c.get("new"))
            .and_then(Value::as_object)
    }

    #[must_use]
    pub fn extra_property(&self, path: &str) -> Option<&Value> {
        value::get_map_path(&self.properties, path)
    }

    #[must_use]
    pub fn context_value(&self, path: &str) -> Option<&Value> {
        value::get_map_path(&self.context, path)
    }

    /// Handle describing this record once stored.
    #[must_use]
    pub fn handle(&self) -> RecordHandle {
        RecordHandle {
            id: self.id.clone(),
            created_at: self.created_at,
        }
    }

    /// String form of a named top-level field.
    ///
    /// Returns `None` for unknown names and for fields that are unset.
    #[must_use]
    pub fn top_level_field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "log_name" => Some(self.log_name.clone()),
            "description" => Some(self.description.clone()),
            "event" => self.event.clone(),
            "template" => self.template.clone(),
            "batch_id" | "batch_uuid" => self.batch_id.map(|id| id.to_string()),
            "created_at" => Some(timestamp(&self.created_at)),
            "subject_type" => self.subject.as_ref().map(|s| s.entity_type.clone()),
            "subject_id" => self.subject.as_ref().map(|s| s.entity_id.clone()),
            "causer_type" => self.causer.as_ref().map(|c| c.entity_type.clone()),
            "causer_id" => self.causer.as_ref().map(|c| c.entity_id.clone()),
            _ => None,
        }
    }
}

/// Canonical timestamp text: RFC 3339, microseconds, `Z` suffix.
///
/// Fixed width, so lexical order matches chronological order.
#[must_use]
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> ActivityRecord {
        let mut properties = Properties::new();
        properties.insert(
            "changes".into(),
            json!({"old": {"status": "draft"}, "new": {"status": "live"}}),
        );
        properties.insert("ticket".into(), json!({"id": 7}));
        ActivityRecord {
            id: "act-0123456789abcdef".into(),
            log_name: DEFAULT_LOG_NAME.into(),
            description: "updated article".into(),
            subject: Some(EntityRef::new("Article", "3")),
            causer: None,
            event: Some("updated".into()),
            properties,
            context: Properties::new(),
            template: None,
            batch_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn change_accessors_reach_into_properties() {
        let r = record();
        assert_eq!(r.old_attributes().unwrap().get("status"), Some(&json!("draft")));
        assert_eq!(r.new_attributes().unwrap().get("status"), Some(&json!("live")));
        assert_eq!(r.extra_property("ticket.id"), Some(&json!(7)));
        assert_eq!(r.context_value("ip"), None);
    }

    #[test]
    fn top_level_fields_render_as_strings() {
        let r = record();
        assert_eq!(r.top_level_field("event").as_deref(), Some("updated"));
        assert_eq!(r.top_level_field("subject_type").as_deref(), Some("Article"));
        assert_eq!(r.top_level_field("causer_id"), None);
        assert_eq!(r.top_level_field("template"), None);
        assert_eq!(r.top_level_field("nope"), None);
    }

    #[test]
    fn timestamps_are_fixed_width() {
        let at = DateTime::parse_from_rfc3339("2026-02-08T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(&at), "2026-02-08T12:00:00.000000Z");
    }
}
