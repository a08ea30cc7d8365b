//! JPEG previews of display buffers.
//!
//! Previews are a presentation convenience: the codec itself never produces
//! JPEG data, but a display buffer can be handed to the `image` crate for a
//! quick look at a page.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::PreviewError;

use super::downsample::DisplayBuffer;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Copy a display buffer into an `image::RgbImage`.
pub fn to_rgb_image(display: &DisplayBuffer) -> Result<RgbImage, PreviewError> {
    RgbImage::from_raw(display.width(), display.height(), display.data().to_vec()).ok_or(
        PreviewError::InvalidBuffer {
            width: display.width(),
            height: display.height(),
            actual: display.data().len(),
        },
    )
}

/// Encode a display buffer as a baseline JPEG.
///
/// Quality is clamped to 1-100.
pub fn encode_jpeg(display: &DisplayBuffer, quality: u8) -> Result<Bytes, PreviewError> {
    let quality = clamp_quality(quality);
    let img = to_rgb_image(display)?;

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
    encoder
        .encode_image(&img)
        .map_err(|e| PreviewError::EncodeError {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
