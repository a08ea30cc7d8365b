//! Container formats.
//!
//! TIFF is the only container: see [`tiff`] for the reader, the writer and
//! the tag vocabulary they share.

pub mod tiff;

/// Whether `bytes` start with a TIFF or BigTIFF signature in either byte order.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    matches!(
        bytes,
        [0x49, 0x49, 0x2A, 0x00, ..]
            | [0x49, 0x49, 0x2B, 0x00, ..]
            | [0x4D, 0x4D, 0x00, 0x2A, ..]
            | [0x4D, 0x4D, 0x00, 0x2B, ..]
    )
}
