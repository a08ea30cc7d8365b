//! Test utilities for integration tests.
//!
//! This module builds TIFF files byte by byte, independently of the crate's
//! writer, so the reader can be exercised on layouts the writer never emits:
//! big-endian, BigTIFF, multi-strip, tiled and bit-reversed files.

use std::path::{Path, PathBuf};

use tiff_slicer::{ImageBuffer, Page};

// =============================================================================
// Field types and tags
// =============================================================================

pub const SHORT: u16 = 3;
pub const LONG: u16 = 4;
pub const RATIONAL: u16 = 5;
pub const LONG8: u16 = 16;

pub const IMAGE_WIDTH: u16 = 256;
pub const IMAGE_LENGTH: u16 = 257;
pub const BITS_PER_SAMPLE: u16 = 258;
pub const COMPRESSION: u16 = 259;
pub const PHOTOMETRIC: u16 = 262;
pub const FILL_ORDER: u16 = 266;
pub const STRIP_OFFSETS: u16 = 273;
pub const SAMPLES_PER_PIXEL: u16 = 277;
pub const ROWS_PER_STRIP: u16 = 278;
pub const STRIP_BYTE_COUNTS: u16 = 279;
pub const X_RESOLUTION: u16 = 282;
pub const Y_RESOLUTION: u16 = 283;
pub const RESOLUTION_UNIT: u16 = 296;
pub const PAGE_NUMBER: u16 = 297;
pub const TILE_WIDTH: u16 = 322;
pub const TILE_LENGTH: u16 = 323;
pub const TILE_OFFSETS: u16 = 324;
pub const TILE_BYTE_COUNTS: u16 = 325;

fn field_type_size(field_type: u16) -> usize {
    match field_type {
        SHORT => 2,
        LONG => 4,
        RATIONAL => 8,
        LONG8 => 8,
        _ => 1,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

impl ByteOrderType {
    fn put(self, data: &mut Vec<u8>, value: u64, size: usize) {
        let bytes = value.to_le_bytes();
        match self {
            ByteOrderType::LittleEndian => data.extend_from_slice(&bytes[..size]),
            ByteOrderType::BigEndian => data.extend(bytes[..size].iter().rev()),
        }
    }
}

/// Encode 16-bit samples in the given byte order.
pub fn encode_samples(samples: &[u16], byte_order: ByteOrderType) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        byte_order.put(&mut data, sample as u64, 2);
    }
    data
}

// =============================================================================
// IFD Builder
// =============================================================================

struct EntryBuilder {
    tag: u16,
    field_type: u16,
    /// One value per element; rationals take two (numerator, denominator)
    values: Vec<u64>,
}

impl EntryBuilder {
    fn count(&self) -> usize {
        if self.field_type == RATIONAL {
            self.values.len() / 2
        } else {
            self.values.len()
        }
    }

    fn encode(&self, byte_order: ByteOrderType) -> Vec<u8> {
        let size = match self.field_type {
            RATIONAL => 4,
            other => field_type_size(other),
        };
        let mut data = Vec::new();
        for &value in &self.values {
            byte_order.put(&mut data, value, size);
        }
        data
    }
}

/// Builder for one directory: tag entries plus strip (or tile) payloads.
///
/// The offset and byte-count entries are generated by [`TiffBuilder::build`].
pub struct IfdBuilder {
    entries: Vec<EntryBuilder>,
    chunks: Vec<Vec<u8>>,
    tiled: bool,
}

impl IfdBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            chunks: Vec::new(),
            tiled: false,
        }
    }

    /// A baseline 16-bit MinIsBlack directory, split into strips of
    /// `rows_per_strip` rows.
    pub fn gray16(
        width: u32,
        height: u32,
        samples: &[u16],
        rows_per_strip: u32,
        byte_order: ByteOrderType,
    ) -> Self {
        let data = encode_samples(samples, byte_order);
        let strip_len = (width * rows_per_strip * 2) as usize;

        let mut builder = Self::new()
            .entry(IMAGE_WIDTH, LONG, &[width as u64])
            .entry(IMAGE_LENGTH, LONG, &[height as u64])
            .entry(BITS_PER_SAMPLE, SHORT, &[16])
            .entry(COMPRESSION, SHORT, &[1])
            .entry(PHOTOMETRIC, SHORT, &[1])
            .entry(SAMPLES_PER_PIXEL, SHORT, &[1])
            .entry(ROWS_PER_STRIP, LONG, &[rows_per_strip as u64])
            .entry(X_RESOLUTION, RATIONAL, &[300, 1])
            .entry(Y_RESOLUTION, RATIONAL, &[300, 1])
            .entry(RESOLUTION_UNIT, SHORT, &[2]);
        for chunk in data.chunks(strip_len.max(1)) {
            builder = builder.chunk(chunk.to_vec());
        }
        builder
    }

    /// Add or replace a tag entry.
    pub fn entry(mut self, tag: u16, field_type: u16, values: &[u64]) -> Self {
        self.entries.retain(|e| e.tag != tag);
        self.entries.push(EntryBuilder {
            tag,
            field_type,
            values: values.to_vec(),
        });
        self
    }

    /// Remove a tag entry.
    pub fn without(mut self, tag: u16) -> Self {
        self.entries.retain(|e| e.tag != tag);
        self
    }

    /// Append one strip (or tile) payload.
    pub fn chunk(mut self, data: Vec<u8>) -> Self {
        self.chunks.push(data);
        self
    }

    /// Store the payloads as tiles of the given size instead of strips.
    pub fn tiled(self, tile_width: u32, tile_height: u32) -> Self {
        let mut builder = self
            .without(ROWS_PER_STRIP)
            .entry(TILE_WIDTH, SHORT, &[tile_width as u64])
            .entry(TILE_LENGTH, SHORT, &[tile_height as u64]);
        builder.tiled = true;
        builder
    }

    /// Reverse the bits of every payload byte and declare FillOrder=2.
    pub fn lsb_fill_order(mut self) -> Self {
        for chunk in &mut self.chunks {
            chunk.iter_mut().for_each(|b| *b = b.reverse_bits());
        }
        self.entry(FILL_ORDER, SHORT, &[2])
    }

    fn chunk_tags(&self) -> (u16, u16) {
        if self.tiled {
            (TILE_OFFSETS, TILE_BYTE_COUNTS)
        } else {
            (STRIP_OFFSETS, STRIP_BYTE_COUNTS)
        }
    }
}

impl Default for IfdBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TIFF Builder
// =============================================================================

/// Builder for creating test TIFF files.
///
/// Each directory is followed by its out-of-line values and then its
/// payloads; all offsets are resolved before any byte is written.
pub struct TiffBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    ifds: Vec<IfdBuilder>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            ifds: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    pub fn add_ifd(mut self, ifd: IfdBuilder) -> Self {
        self.ifds.push(ifd);
        self
    }

    /// Build the TIFF file data.
    pub fn build(mut self) -> Vec<u8> {
        let order = self.byte_order;
        let big = self.is_bigtiff;
        let header_size: u64 = if big { 16 } else { 8 };
        let count_size: usize = if big { 8 } else { 2 };
        let entry_size: usize = if big { 20 } else { 12 };
        let offset_size: usize = if big { 8 } else { 4 };
        let offset_type = if big { LONG8 } else { LONG };

        // First pass: insert offset/count entries with the right element
        // count, then lay out every directory.
        let mut ifd_offsets = Vec::new();
        let mut chunk_offsets = Vec::new();
        let mut position = header_size;
        for ifd in &mut self.ifds {
            let (offsets_tag, counts_tag) = ifd.chunk_tags();
            let counts: Vec<u64> = ifd.chunks.iter().map(|c| c.len() as u64).collect();
            let placeholder = vec![0u64; counts.len()];
            let taken = std::mem::take(ifd);
            *ifd = taken
                .entry(offsets_tag, offset_type, &placeholder)
                .entry(counts_tag, offset_type, &counts);
            ifd.entries.sort_by_key(|e| e.tag);

            ifd_offsets.push(position);
            position += (count_size + ifd.entries.len() * entry_size + offset_size) as u64;
            for entry in &ifd.entries {
                let size = entry.count() * field_type_size(entry.field_type);
                if size > offset_size {
                    position += size as u64;
                }
            }
            let mut offsets = Vec::new();
            for chunk in &ifd.chunks {
                offsets.push(position);
                position += chunk.len() as u64;
            }
            chunk_offsets.push(offsets);
        }

        // Second pass: write.
        let mut data = Vec::with_capacity(position as usize);
        data.extend_from_slice(match order {
            ByteOrderType::LittleEndian => b"II",
            ByteOrderType::BigEndian => b"MM",
        });
        if big {
            order.put(&mut data, 43, 2);
            order.put(&mut data, 8, 2);
            order.put(&mut data, 0, 2);
        } else {
            order.put(&mut data, 42, 2);
        }
        let first = ifd_offsets.first().copied().unwrap_or(0);
        order.put(&mut data, first, offset_size);

        for (idx, ifd) in self.ifds.iter().enumerate() {
            let (offsets_tag, _) = ifd.chunk_tags();
            assert_eq!(data.len() as u64, ifd_offsets[idx]);

            order.put(&mut data, ifd.entries.len() as u64, count_size);
            let mut external = Vec::new();
            let mut external_offset = ifd_offsets[idx]
                + (count_size + ifd.entries.len() * entry_size + offset_size) as u64;

            for entry in &ifd.entries {
                let encoded = if entry.tag == offsets_tag {
                    EntryBuilder {
                        tag: entry.tag,
                        field_type: entry.field_type,
                        values: chunk_offsets[idx].clone(),
                    }
                    .encode(order)
                } else {
                    entry.encode(order)
                };

                order.put(&mut data, entry.tag as u64, 2);
                order.put(&mut data, entry.field_type as u64, 2);
                order.put(&mut data, entry.count() as u64, if big { 8 } else { 4 });
                if encoded.len() <= offset_size {
                    let mut inline = encoded;
                    inline.resize(offset_size, 0);
                    data.extend_from_slice(&inline);
                } else {
                    order.put(&mut data, external_offset, offset_size);
                    external_offset += encoded.len() as u64;
                    external.extend_from_slice(&encoded);
                }
            }

            let next = ifd_offsets.get(idx + 1).copied().unwrap_or(0);
            order.put(&mut data, next, offset_size);
            data.extend_from_slice(&external);
            for chunk in &ifd.chunks {
                data.extend_from_slice(chunk);
            }
        }

        data
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Images and files
// =============================================================================

/// Deterministic samples covering the full 16-bit range.
pub fn gradient_samples(width: u32, height: u32) -> Vec<u16> {
    let last = (width as u64 * height as u64).saturating_sub(1).max(1);
    (0..width as u64 * height as u64)
        .map(|i| (i * 65535 / last) as u16)
        .collect()
}

/// Split row-major samples into rows of `width`.
pub fn to_rows(samples: &[u16], width: u32) -> Vec<Vec<u16>> {
    samples.chunks(width as usize).map(|r| r.to_vec()).collect()
}

/// A 16-bit grayscale page with a recognizable sample at every position.
pub fn test_page(width: u32, height: u32) -> Page {
    let rows = (0..height)
        .map(|y| (0..width).map(|x| (y * 1000 + x) as u16).collect())
        .collect();
    Page::new(ImageBuffer::from_u16_rows(width, rows).unwrap())
}

/// Create a single-strip little-endian 16-bit grayscale TIFF.
pub fn create_gray16_tiff(width: u32, height: u32, samples: &[u16]) -> Vec<u8> {
    TiffBuilder::new()
        .add_ifd(IfdBuilder::gray16(
            width,
            height,
            samples,
            height,
            ByteOrderType::LittleEndian,
        ))
        .build()
}

/// Write bytes to a file in `dir` and return its path.
pub fn write_temp(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Check for a classic or BigTIFF signature.
pub fn is_tiff_magic(data: &[u8]) -> bool {
    tiff_slicer::is_tiff_header(data)
}
