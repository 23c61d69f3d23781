//! Placeholder resolution.
//!
//! A placeholder path is split on `.`; the first segment picks a namespace.
//! Resolution never fails: missing data becomes the empty string or the
//! namespace's sentinel (`System` for a record without a causer, `unknown`
//! for an absent subject or entity field). A causer reference that cannot be
//! loaded renders as `Type#id`.

use chron_core::value::{self, get_map_path, get_path};
use chron_core::{ActivityRecord, EntityResolver, Loggable, Properties};
use serde_json::Value;

/// Rendered for `{causer}` when the record has no causer.
pub const NO_CAUSER: &str = "System";

/// Rendered for absent subjects and missing entity fields.
pub const UNKNOWN: &str = "unknown";

/// Resolves placeholder paths against one record.
///
/// Subject and causer are loaded once, when the resolver is built.
pub struct PlaceholderResolver<'a> {
    record: &'a ActivityRecord,
    subject: Option<Box<dyn Loggable + 'a>>,
    causer: Option<Box<dyn Loggable + 'a>>,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(record: &'a ActivityRecord, entities: &'a dyn EntityResolver) -> Self {
        Self {
            record,
            subject: record.subject.as_ref().and_then(|r| entities.resolve(r)),
            causer: record.causer.as_ref().and_then(|r| entities.resolve(r)),
        }
    }

    /// Resolve a placeholder path such as `causer.name` or `changes.old.status`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        let (root, rest) = match path.split_once('.') {
            Some((root, rest)) => (root, Some(rest)),
            None => (path, None),
        };

        match root {
            "causer" => self.resolve_causer(rest),
            "subject" => self.resolve_subject(rest),
            "properties" => resolve_map(&self.record.properties, rest),
            "context" => resolve_map(&self.record.context, rest),
            "changes" => self.resolve_changes(rest),
            other => self.record.top_level_field(other).unwrap_or_default(),
        }
    }

    fn resolve_causer(&self, rest: Option<&str>) -> String {
        match (rest, &self.causer) {
            (None, Some(causer)) => causer.display_name(),
            (None, None) => self
                .record
                .causer
                .as_ref()
                .map_or_else(|| NO_CAUSER.to_string(), ToString::to_string),
            (Some(path), causer) => entity_field(causer.as_deref(), path),
        }
    }

    fn resolve_subject(&self, rest: Option<&str>) -> String {
        match rest {
            None => self
                .subject
                .as_ref()
                .map_or_else(|| UNKNOWN.to_string(), |subject| subject.display_name()),
            Some("type") => self
                .record
                .subject
                .as_ref()
                .map_or_else(|| UNKNOWN.to_string(), |r| r.short_type().to_lowercase()),
            Some(path) => entity_field(self.subject.as_deref(), path),
        }
    }

    fn resolve_changes(&self, rest: Option<&str>) -> String {
        let empty = Properties::new();
        let changes = self.record.changes().unwrap_or(&empty);
        let Some(path) = rest else {
            return Value::Object(changes.clone()).to_string();
        };

        let found = if let Some(field) = path.strip_prefix("old.") {
            self.record
                .old_attributes()
                .and_then(|old| get_map_path(old, field))
        } else if let Some(field) = path.strip_prefix("new.") {
            self.record
                .new_attributes()
                .and_then(|new| get_map_path(new, field))
        } else {
            get_map_path(changes, path)
        };
        found.map(value::display).unwrap_or_default()
    }
}

/// Full map as compact JSON, or the display form of a nested value.
fn resolve_map(map: &Properties, rest: Option<&str>) -> String {
    match rest {
        None => Value::Object(map.clone()).to_string(),
        Some(path) => get_map_path(map, path)
            .map(value::display)
            .unwrap_or_default(),
    }
}

/// A field of a loaded entity; nested segments walk into the field's value.
fn entity_field(entity: Option<&(dyn Loggable + '_)>, path: &str) -> String {
    let (field, nested) = path.split_once('.').unwrap_or((path, ""));
    entity
        .and_then(|e| e.field_value(field))
        .as_ref()
        .and_then(|v| get_path(v, nested))
        .filter(|v| !v.is_null())
        .map_or_else(
            || {
                tracing::trace!(path, "placeholder field unresolved");
                UNKNOWN.to_string()
            },
            value::display,
        )
}
