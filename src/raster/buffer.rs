//! In-memory image rows.
//!
//! An [`ImageBuffer`] is always non-empty and rectangular: construction
//! checks every row, so downstream code can index rows without re-validating.

use crate::error::RasterError;
use crate::format::tiff::{ByteOrder, TiffMetadataSet};

// =============================================================================
// Rows
// =============================================================================

/// Row storage, tagged by sample depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rows {
    /// 8-bit samples
    Eight(Vec<Vec<u8>>),
    /// 16-bit samples
    Sixteen(Vec<Vec<u16>>),
}

impl Rows {
    fn len(&self) -> usize {
        match self {
            Rows::Eight(rows) => rows.len(),
            Rows::Sixteen(rows) => rows.len(),
        }
    }

    fn row_len(&self, y: usize) -> usize {
        match self {
            Rows::Eight(rows) => rows[y].len(),
            Rows::Sixteen(rows) => rows[y].len(),
        }
    }

    /// Sample depth in bits.
    pub const fn bits_per_sample(&self) -> u16 {
        match self {
            Rows::Eight(_) => 8,
            Rows::Sixteen(_) => 16,
        }
    }
}

// =============================================================================
// ImageBuffer
// =============================================================================

/// Pixel rows of one image plus its geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    samples_per_pixel: u16,
    rows: Rows,
}

impl ImageBuffer {
    /// Build a buffer from rows of `width * samples_per_pixel` samples.
    ///
    /// Height is the number of rows.
    ///
    /// # Errors
    ///
    /// - `EmptyImage` if width, height or samples per pixel is zero
    /// - `RowLengthMismatch` for the first row of the wrong length
    pub fn new(width: u32, samples_per_pixel: u16, rows: Rows) -> Result<Self, RasterError> {
        let height = rows.len() as u32;
        if width == 0 || height == 0 || samples_per_pixel == 0 {
            return Err(RasterError::EmptyImage {
                width,
                height,
                samples_per_pixel,
            });
        }

        let expected = width as usize * samples_per_pixel as usize;
        if let Some(row) = (0..rows.len()).find(|&y| rows.row_len(y) != expected) {
            return Err(RasterError::RowLengthMismatch {
                row,
                expected,
                actual: rows.row_len(row),
            });
        }

        Ok(Self {
            width,
            height,
            samples_per_pixel,
            rows,
        })
    }

    /// Single-sample 16-bit buffer.
    pub fn from_u16_rows(width: u32, rows: Vec<Vec<u16>>) -> Result<Self, RasterError> {
        Self::new(width, 1, Rows::Sixteen(rows))
    }

    /// Single-sample 8-bit buffer.
    pub fn from_u8_rows(width: u32, rows: Vec<Vec<u8>>) -> Result<Self, RasterError> {
        Self::new(width, 1, Rows::Eight(rows))
    }

    /// Single-sample 16-bit buffer from packed little-endian bytes.
    ///
    /// `bytes` must hold exactly `width * height * 2` bytes.
    pub fn from_le_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyImage {
                width,
                height,
                samples_per_pixel: 1,
            });
        }
        let row_samples = width as usize;
        let rows = bytes
            .chunks(row_samples * 2)
            .map(|chunk| decode_u16_samples(chunk, row_samples, ByteOrder::LittleEndian))
            .collect::<Result<Vec<_>, _>>()
            .ok()
            .filter(|rows| rows.len() == height as usize)
            .ok_or(RasterError::ByteLengthMismatch {
                expected: row_samples * height as usize * 2,
                actual: bytes.len(),
            })?;
        Self::from_u16_rows(width, rows)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    #[inline]
    pub fn bits_per_sample(&self) -> u16 {
        self.rows.bits_per_sample()
    }

    /// Samples per row (`width * samples_per_pixel`).
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.samples_per_pixel as usize
    }

    /// Bytes per packed row.
    #[inline]
    pub fn scanline_size(&self) -> usize {
        self.row_len() * (self.bits_per_sample() as usize / 8)
    }

    pub fn rows(&self) -> &Rows {
        &self.rows
    }

    /// 16-bit rows, `None` for an 8-bit buffer.
    pub fn u16_rows(&self) -> Option<&[Vec<u16>]> {
        match &self.rows {
            Rows::Sixteen(rows) => Some(rows),
            Rows::Eight(_) => None,
        }
    }

    /// 8-bit rows, `None` for a 16-bit buffer.
    pub fn u8_rows(&self) -> Option<&[Vec<u8>]> {
        match &self.rows {
            Rows::Eight(rows) => Some(rows),
            Rows::Sixteen(_) => None,
        }
    }

    /// Mutable view of one 16-bit row. The row length cannot change.
    pub fn u16_row_mut(&mut self, y: usize) -> Option<&mut [u16]> {
        match &mut self.rows {
            Rows::Sixteen(rows) => rows.get_mut(y).map(Vec::as_mut_slice),
            Rows::Eight(_) => None,
        }
    }

    /// Mutable view of one 8-bit row.
    pub fn u8_row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        match &mut self.rows {
            Rows::Eight(rows) => rows.get_mut(y).map(Vec::as_mut_slice),
            Rows::Sixteen(_) => None,
        }
    }

    /// Encode row `y` into `scratch` as little-endian bytes.
    ///
    /// `scratch` is cleared first so one allocation serves every row.
    pub fn encode_row_le(&self, y: usize, scratch: &mut Vec<u8>) {
        scratch.clear();
        match &self.rows {
            Rows::Sixteen(rows) => {
                for sample in &rows[y] {
                    scratch.extend_from_slice(&sample.to_le_bytes());
                }
            }
            Rows::Eight(rows) => scratch.extend_from_slice(&rows[y]),
        }
    }

    /// All rows packed as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.scanline_size() * self.height as usize);
        let mut scratch = Vec::with_capacity(self.scanline_size());
        for y in 0..self.height as usize {
            self.encode_row_le(y, &mut scratch);
            out.extend_from_slice(&scratch);
        }
        out
    }
}

/// Decode exactly `sample_count` 16-bit samples from `bytes`.
///
/// The byte length is checked before any sample is read.
pub fn decode_u16_samples(
    bytes: &[u8],
    sample_count: usize,
    byte_order: ByteOrder,
) -> Result<Vec<u16>, RasterError> {
    let expected = sample_count
        .checked_mul(2)
        .ok_or(RasterError::ByteLengthMismatch {
            expected: usize::MAX,
            actual: bytes.len(),
        })?;
    if bytes.len() != expected {
        return Err(RasterError::ByteLengthMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| byte_order.read_u16(pair))
        .collect())
}

// =============================================================================
// Page
// =============================================================================

/// One directory of a TIFF container: pixels plus descriptive metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub image: ImageBuffer,
    pub metadata: TiffMetadataSet,
}

impl Page {
    /// Pair an image with default metadata matching its sample layout.
    pub fn new(image: ImageBuffer) -> Self {
        let metadata = TiffMetadataSet {
            bits_per_sample: image.bits_per_sample(),
            samples_per_pixel: image.samples_per_pixel(),
            ..Default::default()
        };
        Self { image, metadata }
    }

    pub fn with_metadata(image: ImageBuffer, metadata: TiffMetadataSet) -> Self {
        Self { image, metadata }
    }
}

// =============================================================================
// Tests
// =============================================================================
