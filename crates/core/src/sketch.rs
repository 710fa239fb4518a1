//! Decoding of user-submitted sketches.
//!
//! Browsers send the canvas as a data URL (`data:image/png;base64,....`);
//! API clients may send the bare base64 body. Both are accepted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use thiserror::Error;

/// Sketch decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SketchError {
    /// Payload carried no image data.
    #[error("image data is empty")]
    Empty,

    /// Payload is not valid base64.
    #[error("image data is not valid base64: {0}")]
    InvalidBase64(String),

    /// Decoded bytes are not a supported image.
    #[error("image data is not a PNG, JPEG, WebP or GIF image")]
    NotAnImage,

    /// Decoded sketch exceeds the configured limit.
    #[error("sketch size {size} bytes exceeds maximum allowed {max} bytes")]
    TooLarge {
        /// Decoded size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// A decoded sketch ready to be forwarded and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sketch {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type sniffed from the bytes.
    pub mime_type: &'static str,
    /// File extension matching `mime_type`.
    pub extension: &'static str,
}

/// Decodes a base64 sketch payload, with or without a data-URL header.
///
/// # Errors
///
/// Returns an error if the payload is empty, not base64, larger than
/// `max_bytes` once decoded, or not a supported image format.
pub fn decode_sketch(payload: &str, max_bytes: usize) -> Result<Sketch, SketchError> {
    let body = strip_data_url_header(payload).trim();
    if body.is_empty() {
        return Err(SketchError::Empty);
    }

    let bytes = STANDARD
        .decode(body)
        .map_err(|e| SketchError::InvalidBase64(e.to_string()))?;

    if bytes.len() > max_bytes {
        return Err(SketchError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }

    let (mime_type, extension) = sniff_format(&bytes)?;

    Ok(Sketch {
        bytes,
        mime_type,
        extension,
    })
}

/// Drops everything up to and including the first comma.
fn strip_data_url_header(payload: &str) -> &str {
    payload
        .split_once(',')
        .map_or(payload, |(_, body)| body)
}

fn sniff_format(bytes: &[u8]) -> Result<(&'static str, &'static str), SketchError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok(("image/png", "png")),
        Ok(ImageFormat::Jpeg) => Ok(("image/jpeg", "jpg")),
        Ok(ImageFormat::WebP) => Ok(("image/webp", "webp")),
        Ok(ImageFormat::Gif) => Ok(("image/gif", "gif")),
        _ => Err(SketchError::NotAnImage),
    }
}

/// Encodes bytes with the standard base64 alphabet.
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
