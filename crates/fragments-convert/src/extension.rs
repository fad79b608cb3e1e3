//! The closed extension table
//!
//! Extensions are matched exactly: lowercase, without a leading dot.
//! Anything outside the table is unsupported, never inferred.

use crate::error::ConvertError;

/// Every recognized extension and the base type it resolves to
pub const EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("csv", "text/csv"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Resolve an extension to its base type
pub fn resolve_extension(extension: &str) -> Result<&'static str, ConvertError> {
    EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| ConvertError::UnsupportedExtension(extension.to_string()))
}

/// Extensions that resolve to `mime_type`, in table order
pub fn extensions_for(mime_type: &str) -> Vec<&'static str> {
    EXTENSIONS
        .iter()
        .filter(|(_, mime)| *mime == mime_type)
        .map(|(ext, _)| *ext)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registered_type_has_an_extension() {
        for mime in fragments_core::SUPPORTED_TYPES {
            assert!(!extensions_for(mime).is_empty(), "{mime} has no extension");
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(resolve_extension("yml").unwrap(), "application/yaml");
        assert_eq!(resolve_extension("jpeg").unwrap(), "image/jpeg");
        assert_eq!(extensions_for("image/jpeg"), vec!["jpg", "jpeg"]);
    }

    #[test]
    fn test_exact_match_only() {
        for ext in ["JSON", ".json", " json", "markdown", "htm", "svg", ""] {
            assert_eq!(
                resolve_extension(ext),
                Err(ConvertError::UnsupportedExtension(ext.to_string()))
            );
        }
    }
}
