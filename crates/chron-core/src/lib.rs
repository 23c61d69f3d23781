//! # chron-core
//!
//! Core types, ID generation, and error types for Chronicle.
//!
//! This crate provides the foundational types shared across all Chronicle crates:
//! - `ActivityRecord`, the immutable unit every store persists
//! - `FieldAuditEntry`, one changed field in the per-field audit trail
//! - Polymorphic entity references and the `Loggable` capability trait
//! - Lifecycle event names recognised by the observer and template registry
//! - Dot-path lookups over JSON values
//! - ID prefix constants and formatting helpers
//! - Cross-cutting error types

pub mod audit;
pub mod entity;
pub mod errors;
pub mod events;
pub mod ids;
pub mod record;
pub mod value;

pub use audit::FieldAuditEntry;
pub use entity::{EntityRef, EntityRegistry, EntityResolver, EntitySnapshot, Loggable, NoEntities};
pub use errors::CoreError;
pub use events::LifecycleEvent;
pub use record::{ActivityRecord, DEFAULT_LOG_NAME, Properties, RecordHandle};
