//! Image buffers and the operations that act on them.
//!
//! - [`ImageBuffer`] / [`Page`] - decoded rows plus metadata
//! - [`slice_vertically`] - equal-width column partitioning
//! - [`DisplayBuffer`] - 16-bit to 8-bit RGB conversion for display
//! - [`encode_jpeg`] - JPEG preview of a display buffer

mod buffer;
mod downsample;
mod preview;
mod slicer;

pub use buffer::{decode_u16_samples, ImageBuffer, Page, Rows};
pub use downsample::{downsample_sample, DisplayBuffer, CHANNELS};
pub use preview::{
    clamp_quality, encode_jpeg, to_rgb_image, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};
pub use slicer::{slice_file, slice_page, slice_vertically, slice_vertically_with, RemainderPolicy};
