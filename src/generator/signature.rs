//! Signature resolution - normalizes a drawn-canvas payload or an uploaded
//! image file into a single RGB bitmap for the composer.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage};
use thiserror::Error;

/// Where the signature bitmap came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSource {
    Drawn,
    Uploaded,
}

/// A decoded signature image owned by a single generation request.
#[derive(Debug, Clone)]
pub struct SignatureAsset {
    pub bitmap: RgbImage,
    pub source: SignatureSource,
}

// Uploads larger than this are downscaled before embedding; the rendered
// box is 180x54 pt, so nothing above this resolution survives printing.
const MAX_BITMAP_WIDTH: u32 = 1200;
const MAX_BITMAP_HEIGHT: u32 = 600;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("unsupported signature image format ({0}); only PNG and JPEG are accepted")]
    UnsupportedFormat(String),
    #[error("failed to decode signature image: {0}")]
    Decode(String),
    #[error("invalid drawn signature payload: {0}")]
    Encoding(String),
}

/// Resolve the optional signature for one request.
///
/// The drawn canvas takes precedence when both are supplied. Returns
/// `Ok(None)` when neither is present; the composer then renders a labeled
/// blank signature line instead of omitting the block.
pub fn resolve(
    drawn: Option<&str>,
    uploaded: Option<(&[u8], Option<&str>)>,
) -> Result<Option<SignatureAsset>, SignatureError> {
    if let Some(payload) = drawn {
        if !payload.trim().is_empty() {
            return decode_drawn(payload).map(Some);
        }
    }

    if let Some((bytes, content_type)) = uploaded {
        if !bytes.is_empty() {
            return decode_uploaded(bytes, content_type).map(Some);
        }
    }

    Ok(None)
}

/// Decode a drawing-canvas export: base64 PNG, with or without a
/// `data:image/png;base64,` prefix.
fn decode_drawn(payload: &str) -> Result<SignatureAsset, SignatureError> {
    let trimmed = payload.trim();
    let encoded = match trimmed.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };

    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| SignatureError::Encoding(e.to_string()))?;

    let format = sniff_format(&bytes)
        .ok_or_else(|| SignatureError::UnsupportedFormat("drawn canvas payload".to_string()))?;
    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| SignatureError::Decode(e.to_string()))?;

    Ok(SignatureAsset {
        bitmap: flatten_onto_white(image),
        source: SignatureSource::Drawn,
    })
}

fn decode_uploaded(
    bytes: &[u8],
    content_type: Option<&str>,
) -> Result<SignatureAsset, SignatureError> {
    let format = sniff_format(bytes).ok_or_else(|| {
        SignatureError::UnsupportedFormat(content_type.unwrap_or("unknown").to_string())
    })?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| SignatureError::Decode(e.to_string()))?;

    Ok(SignatureAsset {
        bitmap: flatten_onto_white(image),
        source: SignatureSource::Uploaded,
    })
}

/// Detect the image format from magic bytes. Declared content types are
/// advisory only; the bytes decide.
fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.len() >= 8 && data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        Some(ImageFormat::Png)
    } else if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Composite the decoded pixels over a white background, downscaling
/// oversized bitmaps first. Drawn signatures arrive as black strokes on a
/// transparent RGBA canvas.
fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    let image = if image.width() > MAX_BITMAP_WIDTH || image.height() > MAX_BITMAP_HEIGHT {
        image.thumbnail(MAX_BITMAP_WIDTH, MAX_BITMAP_HEIGHT)
    } else {
        image
    };
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}
