//! # chron-log
//!
//! Activity logging for Chronicle.
//!
//! - [`LoggingSession`] builds one record at a time and commits it to an
//!   [`ActivityStore`].
//! - [`ChangeSet`] diffs an entity's pending mutation for `updated` events.
//! - [`MutationObserver`] turns tracked entity lifecycle events into records.
//! - [`FieldAuditTrail`] records a mutation field by field.
//! - [`TemplateEngine`] renders stored records into readable descriptions.
//! - [`ActivityLog`] wires all of it from a [`chron_config::ChronicleConfig`].
//!
//! Stores are async (tokio). Rendering is synchronous and never fails.

pub mod actor;
pub mod audit;
pub mod changes;
pub mod error;
pub mod observer;
pub mod service;
pub mod session;
pub mod store;
pub mod template;

#[cfg(test)]
mod test_support;

pub use actor::{ActorResolver, FixedActor, NoActor};
pub use audit::FieldAuditTrail;
pub use changes::{ChangeRules, ChangeSet, FieldChange, Trackable, TrackedEntity};
pub use error::StoreError;
pub use observer::{MutationObserver, TrackingOptions};
pub use service::ActivityLog;
pub use session::{CauserSlot, LoggingSession, SessionDefaults, SessionState};
pub use store::{
    ActivityStore, ConfiguredStore, FieldAuditStore, JsonlStore, MemoryStore, SqliteStore,
};
pub use template::{ActivityPresenter, ActivityView, TemplateEngine, TemplateRegistry};
