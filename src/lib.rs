//! # tiff-slicer
//!
//! A codec for 16-bit grayscale TIFF images, with deterministic vertical
//! slicing and 16-to-8-bit downsampling for display.
//!
//! ## Features
//!
//! - **Reader**: multi-directory TIFF and BigTIFF, either byte order, one or
//!   more uncompressed strips per directory
//! - **Writer**: single- and multi-page little-endian TIFF with a complete
//!   baseline tag set, written atomically
//! - **Slicer**: equal-width column partitions as independent buffers
//! - **Downsampler**: `round(v / 257)` grayscale-as-RGB display buffers
//!
//! ## Architecture
//!
//! - [`io`] - byte sources for the reader (file and in-memory)
//! - [`mod@format`] - TIFF parsing, validation, metadata, reading and writing
//! - [`raster`] - image buffers, slicing, display conversion, JPEG preview
//! - [`config`] - CLI configuration for the `tiff-slicer` binary
//!
//! The library never installs a tracing subscriber; it only emits events.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tiff_slicer::{read_all, slice_vertically, write_one, Page};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pages = read_all("scan.tif")?;
//! let halves = slice_vertically(&pages[0].image, 2)?;
//! for (i, half) in halves.into_iter().enumerate() {
//!     let page = Page::with_metadata(half, pages[0].metadata.clone());
//!     write_one(&page, format!("out/half{}.tif", i))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod raster;

// Re-export commonly used types
pub use error::{CodecError, IoError, PreviewError, RasterError, TiffError};
pub use format::is_tiff_header;
pub use format::tiff::{
    read_all, read_displayable, write_many, write_one, ByteOrder, Compression, FillOrder,
    Orientation, PageInfo, Photometric, PlanarConfig, ResolutionUnit, TiffMetadataSet,
    TiffReader, TiffWriter, ValidationResult,
};
pub use io::{FileRangeReader, MemoryReader, RangeReader};
pub use raster::{
    downsample_sample, encode_jpeg, slice_file, slice_page, slice_vertically,
    slice_vertically_with, DisplayBuffer, ImageBuffer, Page, RemainderPolicy, Rows,
};
