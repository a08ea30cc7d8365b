//! Stripped 16-bit TIFF reader.
//!
//! Opening a container walks the whole directory chain; pixel data is only
//! read when a page is decoded. Each page is validated on decode, so one
//! unsupported directory does not prevent inspecting the others.

use std::collections::HashSet;
use std::path::Path;

use bytes::BytesMut;
use tracing::debug;

use crate::error::{CodecError, TiffError};
use crate::io::{FileRangeReader, RangeReader};
use crate::raster::{decode_u16_samples, DisplayBuffer, ImageBuffer, Page, Rows};

use super::metadata::{FillOrder, TiffMetadataSet};
use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::tags::TiffTag;
use super::validation::{check_layout, check_strip_count, validate_directory, ValidationResult};
use super::values::ValueReader;

/// Upper bound on directories followed in one container.
///
/// PageNumber is a Short, so no conforming file holds more.
const MAX_DIRECTORIES: usize = u16::MAX as usize;

// =============================================================================
// Strip layout
// =============================================================================

/// Geometry and strip locations of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripLayout {
    pub width: u32,
    pub height: u32,
    pub strip_offsets: Vec<u64>,
    pub strip_byte_counts: Vec<u64>,
}

impl StripLayout {
    /// Read and sanity-check the geometry and strip tags.
    fn load<R: RangeReader + ?Sized>(
        ifd: &Ifd,
        values: &ValueReader<'_, R>,
    ) -> Result<Self, TiffError> {
        let required = |tag: TiffTag| ifd.get_entry_by_tag(tag).ok_or(TiffError::MissingTag(tag.name()));

        let width = values.read_u32(required(TiffTag::ImageWidth)?, TiffTag::ImageWidth.name())?;
        let height = values.read_u32(required(TiffTag::ImageLength)?, TiffTag::ImageLength.name())?;
        if width == 0 || height == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: if width == 0 {
                    TiffTag::ImageWidth.name()
                } else {
                    TiffTag::ImageLength.name()
                },
                message: "image dimensions must be positive".to_string(),
            });
        }

        let strip_offsets =
            values.read_u64_array(required(TiffTag::StripOffsets)?, TiffTag::StripOffsets.name())?;
        let strip_byte_counts = values.read_u64_array(
            required(TiffTag::StripByteCounts)?,
            TiffTag::StripByteCounts.name(),
        )?;
        if strip_offsets.len() != strip_byte_counts.len() {
            return Err(TiffError::InvalidTagValue {
                tag: TiffTag::StripByteCounts.name(),
                message: format!(
                    "{} byte counts for {} strips",
                    strip_byte_counts.len(),
                    strip_offsets.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            strip_offsets,
            strip_byte_counts,
        })
    }

    /// Total bytes stored across all strips.
    fn total_bytes(&self) -> Option<u64> {
        self.strip_byte_counts
            .iter()
            .try_fold(0u64, |acc, &count| acc.checked_add(count))
    }
}

// =============================================================================
// TiffReader
// =============================================================================

/// A TIFF container opened for reading.
///
/// Holds the byte source for its own lifetime; dropping the reader releases
/// the underlying handle.
pub struct TiffReader<R> {
    reader: R,
    header: Option<TiffHeader>,
    directories: Vec<Ifd>,
}

impl TiffReader<FileRangeReader> {
    /// Open a TIFF file by path.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the path does not exist
    /// - `InvalidFormat` if the header or directory chain is malformed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CodecError::invalid_argument("path must not be empty"));
        }
        let reader = FileRangeReader::open(path)?;
        Self::from_reader(reader)
    }
}

impl<R: RangeReader> TiffReader<R> {
    /// Parse the header and directory chain of any byte source.
    ///
    /// A zero-length source, or a header whose first directory offset is 0,
    /// opens as a container with no directories.
    pub fn from_reader(reader: R) -> Result<Self, CodecError> {
        let size = reader.size();
        if size == 0 {
            debug!(source = reader.identifier(), "Empty source, no directories");
            return Ok(Self {
                reader,
                header: None,
                directories: Vec::new(),
            });
        }

        let header_len = (BIGTIFF_HEADER_SIZE as u64).min(size) as usize;
        let header_bytes = reader.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, size)?;

        let directories = Self::parse_chain(&reader, &header)?;
        debug!(
            source = reader.identifier(),
            bigtiff = header.is_bigtiff,
            directories = directories.len(),
            "Opened TIFF container"
        );

        Ok(Self {
            reader,
            header: Some(header),
            directories,
        })
    }

    fn parse_chain(reader: &R, header: &TiffHeader) -> Result<Vec<Ifd>, TiffError> {
        let size = reader.size();
        let mut directories = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 {
            if !visited.insert(offset) {
                return Err(TiffError::IfdCycle(offset));
            }
            if offset >= size {
                return Err(TiffError::InvalidIfdOffset(offset));
            }
            if directories.len() >= MAX_DIRECTORIES {
                return Err(TiffError::InvalidTagValue {
                    tag: "NextIFDOffset",
                    message: format!("more than {} directories", MAX_DIRECTORIES),
                });
            }

            let count_bytes = reader.read_exact_at(offset, header.ifd_count_size())?;
            let entry_count = if header.is_bigtiff {
                header.byte_order.read_u64(&count_bytes)
            } else {
                header.byte_order.read_u16(&count_bytes) as u64
            };

            let ifd_size = Ifd::calculate_size(entry_count, header);
            let ifd_bytes = reader.read_exact_at(offset, ifd_size)?;
            let ifd = Ifd::parse(&ifd_bytes, header)?;

            offset = ifd.next_ifd_offset;
            directories.push(ifd);
        }

        Ok(directories)
    }

    /// Number of directories (pages) in the container.
    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    /// The parsed header, `None` for an empty source.
    pub fn header(&self) -> Option<&TiffHeader> {
        self.header.as_ref()
    }

    fn directory(&self, index: usize) -> Result<(&Ifd, &TiffHeader), CodecError> {
        match (self.directories.get(index), self.header.as_ref()) {
            (Some(ifd), Some(header)) => Ok((ifd, header)),
            _ => Err(CodecError::invalid_argument(format!(
                "directory {} out of range ({} directories)",
                index,
                self.directories.len()
            ))),
        }
    }

    /// Decode the metadata tags of one directory without reading pixels.
    pub fn metadata(&self, index: usize) -> Result<TiffMetadataSet, CodecError> {
        let (ifd, header) = self.directory(index)?;
        let values = ValueReader::new(&self.reader, header);
        Ok(TiffMetadataSet::from_ifd(ifd, &values)?)
    }

    /// Geometry and strip locations of one directory.
    pub fn layout(&self, index: usize) -> Result<StripLayout, CodecError> {
        let (ifd, header) = self.directory(index)?;
        let values = ValueReader::new(&self.reader, header);
        Ok(StripLayout::load(ifd, &values)?)
    }

    /// Validate one directory against the supported subset.
    ///
    /// Format faults that prevent validation (unreadable tags) are returned
    /// as errors; unsupported features are reported in the result.
    pub fn validate(&self, index: usize) -> Result<ValidationResult, CodecError> {
        let (ifd, header) = self.directory(index)?;
        let layout_result = check_layout(ifd, index);
        if !layout_result.is_valid {
            return Ok(layout_result);
        }

        let values = ValueReader::new(&self.reader, header);
        let metadata = TiffMetadataSet::from_ifd(ifd, &values)?;
        let mut result = validate_directory(ifd, &metadata, index);
        if let Some(entry) = ifd.get_entry_by_tag(TiffTag::StripOffsets) {
            check_strip_count(&mut result, entry.count as usize, index);
        }
        Ok(result)
    }

    /// Decode one directory into a page.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` if the directory is outside the supported subset or
    /// its strips do not hold exactly `height` scanlines.
    pub fn read_page(&self, index: usize) -> Result<Page, CodecError> {
        let (ifd, header) = self.directory(index)?;
        check_layout(ifd, index).into_result()?;

        let values = ValueReader::new(&self.reader, header);
        let metadata = TiffMetadataSet::from_ifd(ifd, &values)?;
        let layout = StripLayout::load(ifd, &values)?;

        let mut validation = validate_directory(ifd, &metadata, index);
        check_strip_count(&mut validation, layout.strip_offsets.len(), index);
        for warning in &validation.warnings {
            debug!(directory = index, "{}", warning);
        }
        validation.into_result()?;

        let row_len = u64::from(layout.width) * u64::from(metadata.samples_per_pixel);
        let scanline = row_len * 2;
        let expected = scanline
            .checked_mul(u64::from(layout.height))
            .filter(|&bytes| usize::try_from(bytes).is_ok())
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag: TiffTag::ImageLength.name(),
                message: format!(
                    "{}x{} with {} samples per pixel overflows the addressable size",
                    layout.width, layout.height, metadata.samples_per_pixel
                ),
            })?;
        let actual = layout.total_bytes().unwrap_or(u64::MAX);
        if actual != expected {
            return Err(TiffError::ScanlineMismatch {
                directory: index,
                expected,
                actual,
            }
            .into());
        }

        debug!(
            directory = index,
            width = layout.width,
            height = layout.height,
            strips = layout.strip_offsets.len(),
            "Decoding directory"
        );

        let mut data = BytesMut::with_capacity(expected.min(self.reader.size()) as usize);
        for (&offset, &count) in layout.strip_offsets.iter().zip(&layout.strip_byte_counts) {
            let strip = self
                .reader
                .read_exact_at(offset, count as usize)
                .map_err(TiffError::from)?;
            data.extend_from_slice(&strip);
        }

        if metadata.fill_order == FillOrder::Lsb2Msb {
            data.iter_mut().for_each(|byte| *byte = byte.reverse_bits());
        }

        let rows = data
            .chunks_exact(scanline as usize)
            .map(|line| decode_u16_samples(line, row_len as usize, header.byte_order))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| TiffError::ScanlineMismatch {
                directory: index,
                expected,
                actual,
            })?;

        let image = ImageBuffer::new(layout.width, metadata.samples_per_pixel, Rows::Sixteen(rows))
            .map_err(|e| TiffError::InvalidTagValue {
                tag: TiffTag::SamplesPerPixel.name(),
                message: e.to_string(),
            })?;
        Ok(Page::with_metadata(image, metadata))
    }

    /// Decode every directory in file order.
    pub fn read_all(&self) -> Result<Vec<Page>, CodecError> {
        (0..self.directories.len())
            .map(|index| self.read_page(index))
            .collect()
    }

    /// Decode the first directory for display.
    ///
    /// Returns `None` when the container is empty or the first directory is
    /// not single-sample 16-bit grayscale, or is otherwise outside the
    /// supported subset.
    pub fn read_displayable(&self) -> Result<Option<DisplayBuffer>, CodecError> {
        if self.directories.is_empty() {
            return Ok(None);
        }

        let metadata = match self.metadata(0) {
            Ok(metadata) => metadata,
            Err(CodecError::InvalidFormat(e)) => {
                debug!("First directory not displayable: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if metadata.bits_per_sample != 16
            || metadata.samples_per_pixel != 1
            || !metadata.photometric.is_grayscale()
        {
            debug!(
                bits_per_sample = metadata.bits_per_sample,
                samples_per_pixel = metadata.samples_per_pixel,
                photometric = ?metadata.photometric,
                "First directory not displayable"
            );
            return Ok(None);
        }

        match self.read_page(0) {
            Ok(page) => Ok(DisplayBuffer::from_image(&page.image)),
            Err(CodecError::InvalidFormat(e)) => {
                debug!("First directory not displayable: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Path-level operations
// =============================================================================

/// Read every page of a TIFF file, in directory order.
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Page>, CodecError> {
    TiffReader::open(path)?.read_all()
}

/// Read the first page of a TIFF file as a display buffer.
pub fn read_displayable(path: impl AsRef<Path>) -> Result<Option<DisplayBuffer>, CodecError> {
    TiffReader::open(path)?.read_displayable()
}

// =============================================================================
// Tests
// =============================================================================
