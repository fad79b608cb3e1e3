//! The conversion matrix
//!
//! Same-type is always supported. Otherwise a pairing is supported only when
//! both types belong to the same family.

use fragments_core::SUPPORTED_TYPES;

/// Closed families of mutually convertible types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Text,
    Image,
}

/// Members of the text family
pub const TEXT_FAMILY: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/html",
    "text/csv",
    "application/json",
    "application/yaml",
];

/// Members of the image family
pub const IMAGE_FAMILY: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

impl Family {
    pub fn members(self) -> &'static [&'static str] {
        match self {
            Family::Text => TEXT_FAMILY,
            Family::Image => IMAGE_FAMILY,
        }
    }
}

/// Family a base type belongs to, if any
pub fn family_of(mime_type: &str) -> Option<Family> {
    if TEXT_FAMILY.contains(&mime_type) {
        Some(Family::Text)
    } else if IMAGE_FAMILY.contains(&mime_type) {
        Some(Family::Image)
    } else {
        None
    }
}

/// Whether `from -> to` is in the matrix
pub fn is_supported(from: &str, to: &str) -> bool {
    if from == to {
        return true;
    }
    matches!((family_of(from), family_of(to)), (Some(a), Some(b)) if a == b)
}

/// Base types a fragment of `mime_type` can be read as.
///
/// Its own type comes first, then the rest of its family in registry order.
/// Unregistered types yield an empty list.
pub fn formats(mime_type: &str) -> Vec<&'static str> {
    let Some(family) = family_of(mime_type) else {
        return Vec::new();
    };
    let own = SUPPORTED_TYPES.iter().copied().filter(|t| *t == mime_type);
    let others = SUPPORTED_TYPES
        .iter()
        .copied()
        .filter(|t| *t != mime_type && family.members().contains(t));
    own.chain(others).collect()
}
