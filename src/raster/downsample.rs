//! 16-bit to 8-bit conversion for display.
//!
//! Each sample becomes one intensity, replicated into an RGB triple. The
//! primary output is tightly packed; [`DisplayBuffer::to_padded`] produces
//! stride-aligned rows for presentation layers that need them.

use super::buffer::{ImageBuffer, Page, Rows};

/// Bytes per displayed pixel.
pub const CHANNELS: usize = 3;

/// Scale one 16-bit sample to 8 bits.
///
/// `round(v / 257)` with add-half-then-truncate rounding, so 0 maps to 0,
/// 257 to 1 and 65535 to 255.
#[inline]
pub fn downsample_sample(value: u16) -> u8 {
    (value as f64 / 257.0 + 0.5) as u8
}

// =============================================================================
// DisplayBuffer
// =============================================================================

/// Row-major grayscale-as-RGB pixels, three bytes per pixel, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DisplayBuffer {
    /// Convert a single-sample image.
    ///
    /// 16-bit samples are downsampled; 8-bit samples are replicated as-is.
    /// Returns `None` for multi-sample images, which have no grayscale
    /// reading.
    pub fn from_image(image: &ImageBuffer) -> Option<Self> {
        if image.samples_per_pixel() != 1 {
            return None;
        }

        let pixels = image.width() as usize * image.height() as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        match image.rows() {
            Rows::Sixteen(rows) => {
                for &sample in rows.iter().flatten() {
                    let v = downsample_sample(sample);
                    data.extend_from_slice(&[v, v, v]);
                }
            }
            Rows::Eight(rows) => {
                for &v in rows.iter().flatten() {
                    data.extend_from_slice(&[v, v, v]);
                }
            }
        }

        Some(Self {
            width: image.width(),
            height: image.height(),
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed bytes, `width * height * 3` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGB triple at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let px = &self.data[start..start + CHANNELS];
        Some([px[0], px[1], px[2]])
    }

    /// Row stride in bytes when rows are padded to `alignment` bytes.
    ///
    /// An alignment of 0 or 1 means no padding.
    pub fn stride_for(width: u32, alignment: usize) -> usize {
        let packed = width as usize * CHANNELS;
        match alignment {
            0 | 1 => packed,
            a => packed.div_ceil(a) * a,
        }
    }

    /// Copy rows into a buffer whose stride is a multiple of `alignment`.
    ///
    /// Padding bytes are zero.
    pub fn to_padded(&self, alignment: usize) -> Vec<u8> {
        let packed = self.width as usize * CHANNELS;
        let stride = Self::stride_for(self.width, alignment);
        if stride == packed {
            return self.data.clone();
        }

        let mut out = vec![0u8; stride * self.height as usize];
        for (src, dst) in self.data.chunks_exact(packed).zip(out.chunks_exact_mut(stride)) {
            dst[..packed].copy_from_slice(src);
        }
        out
    }
}

impl Page {
    /// Display buffer for a grayscale page, `None` for any other
    /// photometric interpretation or sample layout.
    pub fn to_display_buffer(&self) -> Option<DisplayBuffer> {
        if !self.metadata.photometric.is_grayscale() {
            return None;
        }
        DisplayBuffer::from_image(&self.image)
    }
}

// =============================================================================
// Tests
// =============================================================================
