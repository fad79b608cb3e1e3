//! Error types for fragments-storage

use fragments_core::FragmentError;
use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Delete of a key the backend does not hold
    #[error("missing entry for key {0}")]
    Missing(String),

    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error during deserialization
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Stored record that no longer passes entity validation
    #[error("Corrupt record for key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Metadata present without content (or the reverse)
    #[error("Inconsistent fragment {key}: {reason}")]
    Inconsistent { key: String, reason: String },

    /// Metadata and content deletes did not both succeed.
    /// The fragment is left partially present until a retry converges.
    #[error(
        "Partial delete of {key} (metadata deleted: {metadata_deleted}, content deleted: {content_deleted}): {cause}"
    )]
    PartialDelete {
        key: String,
        metadata_deleted: bool,
        content_deleted: bool,
        #[source]
        cause: Box<StorageError>,
    },

    /// One of the two writes of a create or update failed after the other
    #[error(
        "Partial write of {key} (metadata written: {metadata_written}, content written: {content_written}): {cause}"
    )]
    PartialWrite {
        key: String,
        metadata_written: bool,
        content_written: bool,
        #[source]
        cause: Box<StorageError>,
    },

    /// Invalid or incomplete backend configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Create a new Missing error
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing(key.into())
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a new Deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Deserialization(err.to_string())
    }
}

impl From<StorageError> for FragmentError {
    fn from(err: StorageError) -> Self {
        FragmentError::Storage(Box::new(err))
    }
}
