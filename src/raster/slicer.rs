//! Vertical partitioning of images into equal-width slices.
//!
//! Slices are column-contiguous, returned left to right, and own their
//! rows. No resampling happens: every output sample is a copy of an input
//! sample.

use std::path::Path;

use tracing::debug;

use crate::error::{CodecError, RasterError};
use crate::format::tiff::TiffReader;

use super::buffer::{ImageBuffer, Page, Rows};

/// What to do with columns left over when the width is not a multiple of
/// the slice count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Fail with `InvalidSliceCount`
    #[default]
    Reject,
    /// Drop the rightmost `width % count` columns
    Truncate,
}

fn slice_width(width: u32, count: u32, policy: RemainderPolicy) -> Result<u32, RasterError> {
    let invalid = RasterError::InvalidSliceCount { count, width };
    if count == 0 || count > width {
        return Err(invalid);
    }
    if width % count != 0 && policy == RemainderPolicy::Reject {
        return Err(invalid);
    }
    Ok(width / count)
}

fn copy_columns<T: Copy>(rows: &[Vec<T>], start: usize, end: usize) -> Vec<Vec<T>> {
    rows.iter().map(|row| row[start..end].to_vec()).collect()
}

/// Split `image` into `count` slices, rejecting uneven widths.
pub fn slice_vertically(image: &ImageBuffer, count: u32) -> Result<Vec<ImageBuffer>, RasterError> {
    slice_vertically_with(image, count, RemainderPolicy::Reject)
}

/// Split `image` into `count` slices of `width / count` columns.
///
/// # Errors
///
/// `InvalidSliceCount` if `count` is zero, exceeds the width, or (under
/// [`RemainderPolicy::Reject`]) does not divide it.
pub fn slice_vertically_with(
    image: &ImageBuffer,
    count: u32,
    policy: RemainderPolicy,
) -> Result<Vec<ImageBuffer>, RasterError> {
    let width = slice_width(image.width(), count, policy)?;
    let spp = image.samples_per_pixel() as usize;
    let step = width as usize * spp;

    debug!(
        count,
        slice_width = width,
        dropped_columns = image.width() - width * count,
        "Slicing image"
    );

    (0..count as usize)
        .map(|i| {
            let (start, end) = (i * step, (i + 1) * step);
            let rows = match image.rows() {
                Rows::Sixteen(rows) => Rows::Sixteen(copy_columns(rows, start, end)),
                Rows::Eight(rows) => Rows::Eight(copy_columns(rows, start, end)),
            };
            ImageBuffer::new(width, image.samples_per_pixel(), rows)
        })
        .collect()
}

/// Slice a page, carrying its metadata onto every slice.
pub fn slice_page(page: &Page, count: u32, policy: RemainderPolicy) -> Result<Vec<Page>, CodecError> {
    Ok(slice_vertically_with(&page.image, count, policy)?
        .into_iter()
        .map(|image| Page::with_metadata(image, page.metadata.clone()))
        .collect())
}

/// Read a TIFF file and slice its first page.
///
/// A file with no directories yields no slices.
pub fn slice_file(
    path: impl AsRef<Path>,
    count: u32,
    policy: RemainderPolicy,
) -> Result<Vec<Page>, CodecError> {
    let reader = TiffReader::open(path)?;
    if reader.directory_count() == 0 {
        return Ok(Vec::new());
    }
    let page = reader.read_page(0)?;
    slice_page(&page, count, policy)
}

// =============================================================================
// Tests
// =============================================================================
