//! Change detection for update events.
//!
//! A [`ChangeSet`] is the filtered old/new diff of one mutation. It starts
//! from the entity's dirty fields, drops excluded ones (always including the
//! timestamp field), applies the allow-list, and pairs each survivor with its
//! pre-mutation value. Order follows the entity's dirty-set iteration order.

use chron_core::{EntityRef, Loggable, Properties};
use serde_json::{Map, Value, json};

/// Default last-modified field, never part of a diff.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "updated_at";

/// An entity whose mutations can be diffed.
pub trait Trackable: Loggable {
    /// Fields changed by the pending mutation, with their new values.
    fn dirty(&self) -> Properties;

    /// Value of `field` before the mutation.
    fn original(&self, field: &str) -> Option<Value>;

    /// Mass-assignable fields, used as the allow-list when none is configured.
    fn fillable(&self) -> Vec<String> {
        Vec::new()
    }

    /// Description to log for `event`, overriding the generated one.
    fn activity_description(&self, _event: &str) -> Option<String> {
        None
    }

    /// Fields kept out of the per-field audit trail. The timestamp field
    /// is always excluded as well.
    fn audit_excluded(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Inclusion/exclusion rules for computing a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRules {
    /// Last-modified field, always excluded.
    pub timestamp_field: String,
    pub excluded: Vec<String>,
    /// Fields to diff. Empty means unset.
    pub allow_list: Vec<String>,
    /// Restrict to tracked fields; with no allow-list, tracked means fillable.
    pub only_dirty: bool,
    /// Log updates whose filtered diff is empty.
    pub log_empty: bool,
}

impl Default for ChangeRules {
    fn default() -> Self {
        Self {
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            excluded: Vec::new(),
            allow_list: Vec::new(),
            only_dirty: true,
            log_empty: false,
        }
    }
}

impl ChangeRules {
    #[must_use]
    pub fn is_excluded(&self, field: &str) -> bool {
        field == self.timestamp_field || self.excluded.iter().any(|f| f == field)
    }

    /// The effective allow-list for `entity`, or `None` when every field passes.
    #[must_use]
    pub fn tracked_fields<T: Trackable + ?Sized>(&self, entity: &T) -> Option<Vec<String>> {
        if !self.allow_list.is_empty() {
            Some(self.allow_list.clone())
        } else if self.only_dirty {
            Some(entity.fillable())
        } else {
            None
        }
    }
}

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// Filtered old/new diff of a single mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// Diff `entity`'s pending mutation under `rules`.
    #[must_use]
    pub fn compute<T: Trackable + ?Sized>(entity: &T, rules: &ChangeRules) -> Self {
        let tracked = rules.tracked_fields(entity);
        let changes = entity
            .dirty()
            .into_iter()
            .filter(|(field, _)| !rules.is_excluded(field))
            .filter(|(field, _)| tracked.as_ref().is_none_or(|t| t.contains(field)))
            .filter_map(|(field, new)| {
                let old = entity.original(&field).unwrap_or(Value::Null);
                (old != new).then_some(FieldChange { field, old, new })
            })
            .collect();
        Self { changes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.field.as_str())
    }

    /// The stored shape: `{"old": {field: value}, "new": {field: value}}`.
    #[must_use]
    pub fn to_old_new(&self) -> Value {
        let mut old = Map::new();
        let mut new = Map::new();
        for change in &self.changes {
            old.insert(change.field.clone(), change.old.clone());
            new.insert(change.field.clone(), change.new.clone());
        }
        json!({"old": old, "new": new})
    }

}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Attribute-bag entity with an original snapshot.
///
/// `set` records a pending change; `sync_original` accepts all pending
/// changes, as a successful save would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntity {
    reference: EntityRef,
    original: Properties,
    attributes: Properties,
    fillable: Vec<String>,
    audit_excluded: Vec<String>,
}

impl TrackedEntity {
    #[must_use]
    pub fn new(reference: EntityRef) -> Self {
        Self {
            reference,
            original: Properties::new(),
            attributes: Properties::new(),
            fillable: Vec::new(),
            audit_excluded: Vec::new(),
        }
    }

    /// Set a persisted attribute (part of the original snapshot).
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        self.original.insert(key.clone(), value.clone());
        self.attributes.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_fillable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_audit_excluded<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audit_excluded = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Change an attribute without touching the original snapshot.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Accept pending changes into the original snapshot.
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }
}

impl Loggable for TrackedEntity {
    fn entity_ref(&self) -> EntityRef {
        self.reference.clone()
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        self.attributes.get(field).cloned()
    }
}

impl Trackable for TrackedEntity {
    fn dirty(&self) -> Properties {
        self.attributes
            .iter()
            .filter(|(key, value)| self.original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn original(&self, field: &str) -> Option<Value> {
        self.original.get(field).cloned()
    }

    fn fillable(&self) -> Vec<String> {
        self.fillable.clone()
    }

    fn audit_excluded(&self) -> Vec<String> {
        self.audit_excluded.clone()
    }
}
