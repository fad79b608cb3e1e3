//! Error types for fragments-convert

use fragments_core::FragmentError;
use thiserror::Error;

/// Errors that can occur while resolving or converting content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Extension outside the extension table
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    /// Pairing outside the conversion matrix
    #[error("unsupported conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Source payload could not be converted
    #[error("conversion {from} -> {to} failed: {reason}")]
    Failed {
        from: String,
        to: String,
        reason: String,
    },
}

impl ConvertError {
    /// Create a new UnsupportedConversion error
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UnsupportedConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new Failed error
    pub fn failed(from: &str, to: &str, reason: impl ToString) -> Self {
        Self::Failed {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<ConvertError> for FragmentError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::UnsupportedExtension(ext) => FragmentError::UnsupportedExtension(ext),
            ConvertError::UnsupportedConversion { from, to } => {
                FragmentError::UnsupportedConversion { from, to }
            }
            ConvertError::Failed { from, to, reason } => {
                FragmentError::ConversionFailed { from, to, reason }
            }
        }
    }
}
