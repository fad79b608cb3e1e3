//! # Fragments Convert
//!
//! Stateless extension resolution and byte-level format conversion.
//!
//! ## Features
//!
//! - **Extension table**: closed `extension -> base type` mapping
//! - **Conversion matrix**: same-type pass-through, otherwise text family to
//!   text family or image family to image family, never across
//! - **Text converters**: markdown, html, json, yaml, csv
//! - **Raster converters**: png, jpeg, webp, gif
//!
//! Conversions are CPU-bound and synchronous. Async callers should run them
//! on a blocking thread.
//!
//! ## Example
//!
//! ```rust
//! use bytes::Bytes;
//! use fragments_convert::convert_to_extension;
//!
//! let csv = Bytes::from_static(b"name,age\nJohn,30");
//! let converted = convert_to_extension(csv, "text/csv", "json").unwrap();
//! assert_eq!(converted.mime_type, "application/json");
//! assert_eq!(&converted.bytes[..], br#"[{"name":"John","age":"30"}]"#);
//! ```

pub mod error;
pub mod extension;
pub mod matrix;
pub mod raster;
pub mod text;

use bytes::Bytes;
use tracing::debug;

pub use error::ConvertError;
pub use extension::{EXTENSIONS, extensions_for, resolve_extension};
pub use matrix::{Family, IMAGE_FAMILY, TEXT_FAMILY, family_of, formats, is_supported};

/// Converted bytes and the base type they are labelled with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// Convert `data` from base type `from` to base type `to`
pub fn convert(data: Bytes, from: &str, to: &str) -> Result<Converted, ConvertError> {
    if !is_supported(from, to) {
        return Err(ConvertError::unsupported(from, to));
    }

    let bytes = if from == to {
        data
    } else {
        match family_of(from) {
            Some(Family::Text) => text::convert_text(&data, from, to)?,
            Some(Family::Image) => raster::convert_image(&data, from, to)?,
            None => return Err(ConvertError::unsupported(from, to)),
        }
    };

    debug!(from, to, size = bytes.len(), "Converted content");
    Ok(Converted {
        bytes,
        mime_type: to.to_string(),
    })
}

/// Resolve `extension` and convert `data` from base type `from` into it
pub fn convert_to_extension(
    data: Bytes,
    from: &str,
    extension: &str,
) -> Result<Converted, ConvertError> {
    let to = resolve_extension(extension)?;
    convert(data, from, to)
}
