//! Lifecycle event names.
//!
//! Records store their event as a free-form string so applications can raise
//! custom events (`login`, `exported`, ...). The lifecycle events the observer
//! binds to by default are modelled here; all use `snake_case` serialization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Entity lifecycle events with built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl LifecycleEvent {
    /// Events tracked when an entity type does not list its own.
    pub const DEFAULT_TRACKED: [Self; 3] = [Self::Created, Self::Updated, Self::Deleted];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            "restored" => Ok(Self::Restored),
            other => Err(CoreError::Validation(format!(
                "'{other}' is not a lifecycle event"
            ))),
        }
    }
}
