//! Uncompressed 16-bit TIFF writer.
//!
//! # Layout
//!
//! The writer emits little-endian classic TIFF. Each directory is laid out
//! as:
//!
//! ```text
//! IFD entries | next IFD offset | out-of-line values | strip data | pad
//! ```
//!
//! Every tag of a directory is fixed, and written, before its first
//! scanline. Strip offsets and the next-directory pointer are computed up
//! front from the geometry, so the file is written strictly sequentially.
//!
//! Output goes to a temporary file in the destination directory which is
//! renamed over the destination only after the last directory is complete.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{CodecError, IoError, RasterError, TiffError};
use crate::raster::{ImageBuffer, Page, Rows};

use super::metadata::{to_rational, FillOrder, TiffMetadataSet};
use super::parser::{BYTE_ORDER_LITTLE_ENDIAN, TIFF_HEADER_SIZE, VERSION_TIFF};
use super::tags::{FieldType, TiffTag, SUBFILE_TYPE_PAGE};

/// Size of one classic IFD entry.
const ENTRY_SIZE: u64 = 12;

// =============================================================================
// Tag entries
// =============================================================================

/// One tag with its little-endian encoded value.
#[derive(Debug, Clone)]
struct Entry {
    tag: TiffTag,
    field_type: FieldType,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn shorts(tag: TiffTag, values: &[u16]) -> Self {
        Self {
            tag,
            field_type: FieldType::Short,
            count: values.len() as u32,
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn longs(tag: TiffTag, values: &[u32]) -> Self {
        Self {
            tag,
            field_type: FieldType::Long,
            count: values.len() as u32,
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn rational(tag: TiffTag, value: f32) -> Self {
        let (numerator, denominator) = to_rational(value);
        let mut data = numerator.to_le_bytes().to_vec();
        data.extend_from_slice(&denominator.to_le_bytes());
        Self {
            tag,
            field_type: FieldType::Rational,
            count: 1,
            data,
        }
    }

    fn is_inline(&self) -> bool {
        self.data.len() <= FieldType::INLINE_THRESHOLD_TIFF
    }

    /// Bytes this entry occupies after the entry table, word aligned.
    fn out_of_line_size(&self) -> u64 {
        if self.is_inline() {
            0
        } else {
            word_align(self.data.len() as u64)
        }
    }
}

#[inline]
fn word_align(n: u64) -> u64 {
    n + (n & 1)
}

// =============================================================================
// Directory planning
// =============================================================================

/// Fully resolved layout of one directory.
#[derive(Debug, Clone)]
struct DirectoryPlan {
    /// File offset of the IFD
    offset: u64,
    /// Entries sorted by tag
    entries: Vec<Entry>,
    /// Offset of the next IFD, 0 for the last directory
    next_ifd_offset: u64,
    /// Rows per strip as written
    rows_per_strip: u32,
    /// File offset just past this directory's padded strip data
    end: u64,
}

/// Page index and count for multi-page containers.
#[derive(Debug, Clone, Copy)]
struct PagePosition {
    index: u16,
    total: u16,
}

fn too_large() -> CodecError {
    CodecError::invalid_argument("image data exceeds the 4 GiB classic TIFF limit")
}

impl DirectoryPlan {
    fn new(
        offset: u64,
        image: &ImageBuffer,
        metadata: &TiffMetadataSet,
        position: Option<PagePosition>,
        is_last: bool,
    ) -> Result<Self, CodecError> {
        let height = image.height();
        let rows_per_strip = metadata.rows_per_strip.unwrap_or(height).clamp(1, height);
        let strip_count = height.div_ceil(rows_per_strip) as usize;
        let scanline = image.scanline_size() as u64;

        let strip_byte_counts: Vec<u32> = (0..strip_count as u32)
            .map(|i| {
                let rows = rows_per_strip.min(height - i * rows_per_strip) as u64;
                u32::try_from(rows * scanline).map_err(|_| too_large())
            })
            .collect::<Result<_, _>>()?;

        let spp = image.samples_per_pixel();
        let mut entries = vec![
            Entry::longs(TiffTag::ImageWidth, &[image.width()]),
            Entry::longs(TiffTag::ImageLength, &[height]),
            Entry::shorts(TiffTag::BitsPerSample, &vec![16u16; spp as usize]),
            Entry::shorts(TiffTag::Compression, &[metadata.compression.as_u16()]),
            Entry::shorts(TiffTag::PhotometricInterpretation, &[metadata.photometric as u16]),
            Entry::shorts(TiffTag::FillOrder, &[metadata.fill_order as u16]),
            Entry::longs(TiffTag::StripOffsets, &vec![0u32; strip_count]),
            Entry::shorts(TiffTag::Orientation, &[metadata.orientation as u16]),
            Entry::shorts(TiffTag::SamplesPerPixel, &[spp]),
            Entry::longs(TiffTag::RowsPerStrip, &[rows_per_strip]),
            Entry::longs(TiffTag::StripByteCounts, &strip_byte_counts),
            Entry::rational(TiffTag::XResolution, metadata.x_resolution),
            Entry::rational(TiffTag::YResolution, metadata.y_resolution),
            Entry::shorts(TiffTag::PlanarConfiguration, &[metadata.planar_config as u16]),
            Entry::shorts(TiffTag::ResolutionUnit, &[metadata.resolution_unit as u16]),
        ];
        if let Some(position) = position {
            entries.push(Entry::longs(TiffTag::NewSubfileType, &[SUBFILE_TYPE_PAGE]));
            entries.push(Entry::shorts(
                TiffTag::PageNumber,
                &[position.index, position.total],
            ));
        }
        entries.sort_by_key(|e| e.tag.as_u16());

        let table_size = 2 + entries.len() as u64 * ENTRY_SIZE + 4;
        let values_size: u64 = entries.iter().map(Entry::out_of_line_size).sum();
        let strip_start = offset + table_size + values_size;

        let mut strip_offsets = Vec::with_capacity(strip_count);
        let mut cursor = strip_start;
        for &count in &strip_byte_counts {
            strip_offsets.push(u32::try_from(cursor).map_err(|_| too_large())?);
            cursor += count as u64;
        }
        if let Some(entry) = entries.iter_mut().find(|e| e.tag == TiffTag::StripOffsets) {
            *entry = Entry::longs(TiffTag::StripOffsets, &strip_offsets);
        }

        let end = word_align(cursor);
        let next_ifd_offset = if is_last { 0 } else { end };
        if next_ifd_offset > u32::MAX as u64 {
            return Err(too_large());
        }

        Ok(Self {
            offset,
            entries,
            next_ifd_offset,
            rows_per_strip,
            end,
        })
    }

    /// Write the entry table, next pointer and out-of-line values.
    fn write_tags<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(&(self.entries.len() as u16).to_le_bytes())?;

        let mut value_offset = self.offset + 2 + self.entries.len() as u64 * ENTRY_SIZE + 4;
        for entry in &self.entries {
            out.write_all(&entry.tag.as_u16().to_le_bytes())?;
            out.write_all(&entry.field_type.as_u16().to_le_bytes())?;
            out.write_all(&entry.count.to_le_bytes())?;
            if entry.is_inline() {
                let mut field = [0u8; 4];
                field[..entry.data.len()].copy_from_slice(&entry.data);
                out.write_all(&field)?;
            } else {
                out.write_all(&(value_offset as u32).to_le_bytes())?;
                value_offset += entry.out_of_line_size();
            }
        }
        out.write_all(&(self.next_ifd_offset as u32).to_le_bytes())?;

        for entry in self.entries.iter().filter(|e| !e.is_inline()) {
            out.write_all(&entry.data)?;
            if entry.data.len() % 2 == 1 {
                out.write_all(&[0])?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Scanline encoder
// =============================================================================

/// Streams the scanlines of one directory in strictly increasing row order.
struct DirectoryEncoder<'a, W: Write> {
    out: &'a mut W,
    directory: usize,
    height: u32,
    scanline_size: usize,
    next_row: u32,
    reverse_bits: bool,
    written: u64,
}

impl<'a, W: Write> DirectoryEncoder<'a, W> {
    /// Write the directory's tags; scanlines may follow.
    fn begin(
        out: &'a mut W,
        directory: usize,
        plan: &DirectoryPlan,
        image: &ImageBuffer,
        fill_order: FillOrder,
    ) -> Result<Self, TiffError> {
        plan.write_tags(out).map_err(write_error)?;
        Ok(Self {
            out,
            directory,
            height: image.height(),
            scanline_size: image.scanline_size(),
            next_row: 0,
            reverse_bits: fill_order == FillOrder::Lsb2Msb,
            written: 0,
        })
    }

    fn write_scanline(&mut self, row: u32, line: &mut [u8]) -> Result<(), TiffError> {
        if row != self.next_row || row >= self.height {
            return Err(TiffError::ScanlineOutOfOrder {
                expected: self.next_row,
                actual: row,
            });
        }
        if line.len() != self.scanline_size {
            return Err(TiffError::ScanlineMismatch {
                directory: self.directory,
                expected: self.scanline_size as u64,
                actual: line.len() as u64,
            });
        }
        if self.reverse_bits {
            line.iter_mut().for_each(|b| *b = b.reverse_bits());
        }
        self.out.write_all(line).map_err(write_error)?;
        self.next_row += 1;
        self.written += line.len() as u64;
        Ok(())
    }

    /// Check every row arrived and pad the strip data to a word boundary.
    fn finish(self) -> Result<(), TiffError> {
        if self.next_row != self.height {
            return Err(TiffError::ScanlineMismatch {
                directory: self.directory,
                expected: self.height as u64 * self.scanline_size as u64,
                actual: self.written,
            });
        }
        if self.written % 2 == 1 {
            self.out.write_all(&[0]).map_err(write_error)?;
        }
        Ok(())
    }
}

fn write_error(e: std::io::Error) -> TiffError {
    TiffError::Io(IoError::Write {
        path: "<tiff stream>".to_string(),
        message: e.to_string(),
    })
}

// =============================================================================
// TiffWriter
// =============================================================================

/// Writes pages to one destination path.
#[derive(Debug, Clone)]
pub struct TiffWriter {
    path: PathBuf,
}

impl TiffWriter {
    /// Target `path`, which must be non-empty.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CodecError::invalid_argument("path must not be empty"));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one page without paging tags.
    pub fn write_single_page(&self, page: &Page) -> Result<(), CodecError> {
        self.write_pages(std::slice::from_ref(page))
    }

    /// Write several pages of identical geometry.
    ///
    /// Every directory carries `NewSubfileType = page` and
    /// `PageNumber = (index, total)` when more than one page is written.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty sequence or mismatched geometry.
    pub fn write_multi_page(&self, pages: &[Page]) -> Result<(), CodecError> {
        if pages.is_empty() {
            return Err(CodecError::invalid_argument(
                "multi-page write needs at least one page",
            ));
        }
        self.write_pages(pages)
    }

    /// Write 16-bit rows as a single page.
    ///
    /// No rows is a successful no-op that creates nothing.
    pub fn write_rows(
        &self,
        rows: &[Vec<u16>],
        width: u32,
        metadata: &TiffMetadataSet,
    ) -> Result<(), CodecError> {
        if rows.is_empty() {
            debug!(path = %self.path.display(), "No rows to write");
            return Ok(());
        }
        if width == 0 {
            return Err(CodecError::invalid_argument("width must be positive"));
        }
        let image = ImageBuffer::new(
            width,
            metadata.samples_per_pixel,
            Rows::Sixteen(rows.to_vec()),
        )?;
        self.write_single_page(&Page::with_metadata(image, metadata.clone()))
    }

    fn check_pages(pages: &[Page]) -> Result<(), CodecError> {
        let (width, height) = (pages[0].image.width(), pages[0].image.height());
        if pages.len() > u16::MAX as usize {
            return Err(CodecError::invalid_argument(format!(
                "{} pages exceed the PageNumber range",
                pages.len()
            )));
        }

        for (index, page) in pages.iter().enumerate() {
            let image = &page.image;
            if (image.width(), image.height()) != (width, height) {
                return Err(CodecError::invalid_argument(format!(
                    "page {} is {}x{}, expected {}x{}",
                    index,
                    image.width(),
                    image.height(),
                    width,
                    height
                )));
            }
            if image.bits_per_sample() != 16 {
                return Err(RasterError::BitDepthMismatch {
                    expected: 16,
                    actual: image.bits_per_sample(),
                }
                .into());
            }
            page.metadata
                .check_writable()
                .map_err(|m| CodecError::invalid_argument(format!("page {}: {}", index, m)))?;
            if page.metadata.samples_per_pixel != image.samples_per_pixel() {
                return Err(CodecError::invalid_argument(format!(
                    "page {}: metadata declares {} sample(s) per pixel, image has {}",
                    index,
                    page.metadata.samples_per_pixel,
                    image.samples_per_pixel()
                )));
            }
        }
        Ok(())
    }

    /// Create the parent directory and a temporary file beside the target.
    fn prepare(&self) -> Result<NamedTempFile, CodecError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| CodecError::Path {
            path: parent.clone(),
            message: e.to_string(),
        })?;
        if self.path.is_dir() {
            return Err(CodecError::Path {
                path: self.path.clone(),
                message: "destination is a directory".to_string(),
            });
        }
        NamedTempFile::new_in(&parent).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, e: std::io::Error) -> CodecError {
        CodecError::Io(IoError::Write {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn write_pages(&self, pages: &[Page]) -> Result<(), CodecError> {
        Self::check_pages(pages)?;
        let plans = Self::plan(pages)?;
        let tmp = self.prepare()?;

        let mut out = BufWriter::new(tmp);
        Self::encode(&mut out, pages, &plans).map_err(|e| match e {
            TiffError::Io(IoError::Write { message, .. }) => CodecError::Io(IoError::Write {
                path: self.path.display().to_string(),
                message,
            }),
            other => other.into(),
        })?;

        let tmp = out.into_inner().map_err(|e| self.io_error(e.into_error()))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!(
            path = %self.path.display(),
            pages = pages.len(),
            "Wrote TIFF container"
        );
        Ok(())
    }

    /// Lay out every directory before anything is written.
    fn plan(pages: &[Page]) -> Result<Vec<DirectoryPlan>, CodecError> {
        let total = pages.len();
        let mut offset = TIFF_HEADER_SIZE as u64;
        let mut plans = Vec::with_capacity(total);

        for (index, page) in pages.iter().enumerate() {
            let position = (total > 1).then_some(PagePosition {
                index: index as u16,
                total: total as u16,
            });
            let plan = DirectoryPlan::new(
                offset,
                &page.image,
                &page.metadata,
                position,
                index + 1 == total,
            )?;
            offset = plan.end;
            plans.push(plan);
        }
        Ok(plans)
    }

    fn encode<W: Write>(
        out: &mut W,
        pages: &[Page],
        plans: &[DirectoryPlan],
    ) -> Result<(), TiffError> {
        let mut header = Vec::with_capacity(TIFF_HEADER_SIZE);
        header.extend_from_slice(&BYTE_ORDER_LITTLE_ENDIAN.to_le_bytes());
        header.extend_from_slice(&VERSION_TIFF.to_le_bytes());
        header.extend_from_slice(&(TIFF_HEADER_SIZE as u32).to_le_bytes());
        out.write_all(&header).map_err(write_error)?;

        let mut scratch = Vec::new();
        for (index, (page, plan)) in pages.iter().zip(plans).enumerate() {
            let mut encoder =
                DirectoryEncoder::begin(out, index, plan, &page.image, page.metadata.fill_order)?;
            for row in 0..page.image.height() {
                page.image.encode_row_le(row as usize, &mut scratch);
                encoder.write_scanline(row, &mut scratch)?;
            }
            encoder.finish()?;

            debug!(
                directory = index,
                ifd_offset = plan.offset,
                rows_per_strip = plan.rows_per_strip,
                "Finalized directory"
            );
        }

        out.flush().map_err(write_error)
    }
}

// =============================================================================
// Path-level operations
// =============================================================================

/// Write one page to `path`.
pub fn write_one(page: &Page, path: impl AsRef<Path>) -> Result<(), CodecError> {
    TiffWriter::new(path)?.write_single_page(page)
}

/// Write pages to `path` as one multi-page container.
pub fn write_many(pages: &[Page], path: impl AsRef<Path>) -> Result<(), CodecError> {
    TiffWriter::new(path)?.write_multi_page(pages)
}

// =============================================================================
// Tests
// =============================================================================
