//! Error taxonomy shared by every fragments crate.
//!
//! Each failure a caller can observe maps to exactly one variant. Storage and
//! conversion crates provide `From` impls into [`FragmentError`] so `?` keeps
//! the classification intact.

use thiserror::Error;

/// Classified failure returned by fragment operations
#[derive(Debug, Error)]
pub enum FragmentError {
    /// Malformed input to fragment construction
    #[error("validation error: {0}")]
    Validation(String),

    /// Content type outside the supported-type registry
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Missing record, or a record owned by someone else
    #[error("fragment not found: {0}")]
    NotFound(String),

    /// Update attempted to change the base mime type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Extension outside the conversion table
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    /// Known extension, but the pairing is not in the conversion matrix
    #[error("unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Supported pairing, malformed source payload
    #[error("conversion {from} -> {to} failed: {reason}")]
    ConversionFailed {
        from: String,
        to: String,
        reason: String,
    },

    /// Backend I/O or consistency failure
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FragmentError {
    /// Create a new Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Whether this error reports a missing (or foreign) fragment
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias used across the fragments crates
pub type Result<T> = std::result::Result<T, FragmentError>;
