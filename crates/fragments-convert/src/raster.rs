//! Raster (image family) conversions
//!
//! Source bytes are decoded with the format named by the source type and
//! re-encoded into the target format at identical dimensions. JPEG has no
//! alpha channel, so JPEG targets are flattened to RGB. The WebP encoder is
//! lossless.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::ConvertError;

fn format_of(mime_type: &str) -> Option<ImageFormat> {
    ImageFormat::from_mime_type(mime_type)
}

/// Convert between two members of the image family
pub fn convert_image(data: &Bytes, from: &str, to: &str) -> Result<Bytes, ConvertError> {
    let (Some(source_format), Some(target_format)) = (format_of(from), format_of(to)) else {
        return Err(ConvertError::unsupported(from, to));
    };

    let decoded = image::load_from_memory_with_format(data, source_format)
        .map_err(|e| ConvertError::failed(from, to, e))?;
    let (width, height) = (decoded.width(), decoded.height());

    let prepared = match target_format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        ImageFormat::WebP | ImageFormat::Gif => DynamicImage::ImageRgba8(decoded.to_rgba8()),
        _ => decoded,
    };

    let mut out = Cursor::new(Vec::new());
    prepared
        .write_to(&mut out, target_format)
        .map_err(|e| ConvertError::failed(from, to, e))?;

    debug!(from, to, width, height, size = out.get_ref().len(), "Re-encoded image");
    Ok(Bytes::from(out.into_inner()))
}
