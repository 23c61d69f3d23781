//! Cross-cutting error types for Chronicle.
//!
//! Errors that can originate from core value handling. Storage and
//! configuration errors live in their respective crates (`StoreError`,
//! `ConfigError`); the CLI converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by core Chronicle types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity reference string did not have the `Type:id` shape.
    #[error("Invalid entity reference '{0}': expected 'Type:id'")]
    InvalidEntityRef(String),

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
