//! TIFF codec for uncompressed 16-bit stripped images.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values, pixel samples included, are read in that order.
//!   The writer always emits little-endian files.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets, BigTIFF 64-bit ones.
//!   Both are read; only classic TIFF is written.
//!
//! - **IFD (Image File Directory)**: One page of the container. Directories form a
//!   linked list starting at the header, and their order is preserved on read and write.
//!
//! - **Strips**: Pixel data is stored as runs of whole scanlines. The writer uses a single
//!   strip per directory unless `rows_per_strip` says otherwise.

mod metadata;
mod parser;
mod reader;
mod tags;
mod validation;
mod values;
mod writer;

pub use metadata::{
    to_rational, FillOrder, Orientation, PageInfo, Photometric, PlanarConfig, ResolutionUnit,
    TiffMetadataSet, DEFAULT_RESOLUTION,
};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use reader::{read_all, read_displayable, StripLayout, TiffReader};
pub use tags::{Compression, FieldType, TiffTag, SUBFILE_TYPE_PAGE};
pub use validation::{
    check_layout, check_metadata, check_strip_count, validate_directory, ValidationError,
    ValidationResult,
};
pub use values::ValueReader;
pub use writer::{write_many, write_one, TiffWriter};
