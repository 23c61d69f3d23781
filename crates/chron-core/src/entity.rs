//! Polymorphic entity references.
//!
//! A record points at its subject and causer through an [`EntityRef`]
//! (type + id) rather than holding the entity itself. Anything that wants to
//! appear in a record implements [`Loggable`]; at render time an
//! [`EntityResolver`] turns references back into loggable entities.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::value;

/// Type + id reference to an entity.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct EntityRef {
    /// Type name, optionally module-qualified (`blog::Article`).
    pub entity_type: String,
    pub entity_id: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
        }
    }

    /// The type name without any module qualification.
    ///
    /// `blog::Article`, `App\Models\Article` and `models.Article` all
    /// shorten to `Article`.
    #[must_use]
    pub fn short_type(&self) -> &str {
        self.entity_type
            .rsplit([':', '\\', '.'])
            .next()
            .unwrap_or(&self.entity_type)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.entity_id)
    }
}

/// Parses the `Type:id` form used on the command line.
impl FromStr for EntityRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((ty, id)) if !ty.is_empty() && !id.is_empty() && !ty.ends_with(':') => {
                Ok(Self::new(ty, id))
            }
            _ => Err(CoreError::InvalidEntityRef(s.to_string())),
        }
    }
}

/// Capability an entity provides to be logged and rendered.
pub trait Loggable {
    /// The reference stored on the record.
    fn entity_ref(&self) -> EntityRef;

    /// Value of a named field, if the entity has it.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Human-readable name. Defaults to the `name` field, then the reference.
    fn display_name(&self) -> String {
        self.field_value("name")
            .map(|v| value::display(&v))
            .unwrap_or_else(|| self.entity_ref().to_string())
    }
}

impl<T: Loggable + ?Sized> Loggable for &T {
    fn entity_ref(&self) -> EntityRef {
        (**self).entity_ref()
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        (**self).field_value(field)
    }

    fn display_name(&self) -> String {
        (**self).display_name()
    }
}

/// A plain attribute snapshot of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntitySnapshot {
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntitySnapshot {
    #[must_use]
    pub fn new(reference: EntityRef) -> Self {
        Self {
            entity_type: reference.entity_type,
            entity_id: reference.entity_id,
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Loggable for EntitySnapshot {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(&self.entity_type, &self.entity_id)
    }

    fn field_value(&self, field: &str) -> Option<Value> {
        self.attributes.get(field).cloned()
    }
}

/// Loads entities back from references when a record is rendered.
pub trait EntityResolver {
    fn resolve(&self, reference: &EntityRef) -> Option<Box<dyn Loggable + '_>>;
}

/// Resolver that never finds anything. Templates fall back to sentinels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

impl EntityResolver for NoEntities {
    fn resolve(&self, _reference: &EntityRef) -> Option<Box<dyn Loggable + '_>> {
        None
    }
}

/// In-memory lookup table of entity snapshots.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityRef, EntitySnapshot>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for its reference.
    pub fn insert(&mut self, snapshot: EntitySnapshot) {
        self.entities.insert(snapshot.entity_ref(), snapshot);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<EntitySnapshot> for EntityRegistry {
    fn from_iter<I: IntoIterator<Item = EntitySnapshot>>(iter: I) -> Self {
        let mut registry = Self::new();
        for snapshot in iter {
            registry.insert(snapshot);
        }
        registry
    }
}

impl EntityResolver for EntityRegistry {
    fn resolve(&self, reference: &EntityRef) -> Option<Box<dyn Loggable + '_>> {
        self.entities
            .get(reference)
            .map(|snapshot| Box::new(snapshot) as Box<dyn Loggable + '_>)
    }
}
