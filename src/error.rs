use std::path::PathBuf;

use thiserror::Error;

/// I/O errors that can occur when reading from or writing to a byte source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Failure while reading from the source
    #[error("Read error on {source_id}: {message}")]
    Read { source_id: String, message: String },

    /// Failure while writing to the destination
    #[error("Write error on {path}: {message}")]
    Write { path: String, message: String },

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Source file does not exist
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Errors that can occur when parsing or encoding TIFF containers
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// The next-IFD chain loops back on itself
    #[error("IFD chain revisits offset {0}")]
    IfdCycle(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unsupported compression scheme
    #[error("Unsupported compression: {0} (only uncompressed data is supported)")]
    UnsupportedCompression(String),

    /// Sample depth other than 16 bits
    #[error("Unsupported bit depth: {0} bits per sample (only 16 is supported)")]
    UnsupportedBitDepth(u16),

    /// Multi-sample pixels stored as separate planes
    #[error("Unsupported planar configuration: {0}")]
    UnsupportedPlanarConfig(u16),

    /// File uses tiles instead of strips
    #[error("Unsupported organization: file uses tiles instead of strips")]
    TiledOrganization,

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),

    /// Strip data does not match the directory's declared geometry
    #[error("Scanline size mismatch in directory {directory}: expected {expected} bytes, got {actual}")]
    ScanlineMismatch {
        directory: usize,
        expected: u64,
        actual: u64,
    },

    /// Scanlines must be written in strictly increasing row order
    #[error("Scanline written out of order: expected row {expected}, got {actual}")]
    ScanlineOutOfOrder { expected: u32, actual: u32 },
}

/// Errors raised while building or partitioning image buffers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// Width, height or sample count is zero
    #[error("Image must be non-empty: {width}x{height} with {samples_per_pixel} sample(s) per pixel")]
    EmptyImage {
        width: u32,
        height: u32,
        samples_per_pixel: u16,
    },

    /// A row does not hold `width * samples_per_pixel` samples
    #[error("Row {row} has {actual} samples, expected {expected}")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Raw byte input does not match the requested geometry
    #[error("Byte length mismatch: expected {expected} bytes, got {actual}")]
    ByteLengthMismatch { expected: usize, actual: usize },

    /// Slice count is zero, exceeds the width, or does not divide it
    #[error("Cannot slice width {width} into {count} part(s)")]
    InvalidSliceCount { count: u32, width: u32 },

    /// Operation needs a different sample depth
    #[error("Expected {expected}-bit samples, image has {actual}-bit samples")]
    BitDepthMismatch { expected: u16, actual: u16 },
}

/// Errors from preview image encoding.
#[derive(Debug, Clone, Error)]
pub enum PreviewError {
    /// Display buffer length does not match its geometry
    #[error("Display buffer of {actual} bytes does not cover {width}x{height} RGB pixels")]
    InvalidBuffer { width: u32, height: u32, actual: usize },

    /// JPEG encoding failed
    #[error("Failed to encode preview: {message}")]
    EncodeError { message: String },
}

/// Errors surfaced by the public read/write/slice operations.
///
/// Each variant is one failure kind a caller can act on. Nothing is retried
/// internally.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Empty path, non-positive dimensions, bad slice count, bad metadata
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Destination directory is missing and could not be created
    #[error("Path error for {path}: {message}")]
    Path { path: PathBuf, message: String },

    /// Source file does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// File is not a parseable TIFF or is structurally inconsistent
    #[error("Invalid format: {0}")]
    InvalidFormat(TiffError),

    /// Underlying read or write fault
    #[error("I/O error: {0}")]
    Io(IoError),
}

impl CodecError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        CodecError::InvalidArgument(message.into())
    }
}

impl From<IoError> for CodecError {
    fn from(error: IoError) -> Self {
        match error {
            IoError::NotFound(path) => CodecError::NotFound(PathBuf::from(path)),
            other => CodecError::Io(other),
        }
    }
}

impl From<TiffError> for CodecError {
    fn from(error: TiffError) -> Self {
        match error {
            // Structure pointing past end of file is a format problem
            TiffError::Io(IoError::RangeOutOfBounds { .. }) => CodecError::InvalidFormat(error),
            TiffError::Io(io) => CodecError::from(io),
            TiffError::ScanlineOutOfOrder { .. } => CodecError::InvalidArgument(error.to_string()),
            other => CodecError::InvalidFormat(other),
        }
    }
}

impl From<RasterError> for CodecError {
    fn from(error: RasterError) -> Self {
        CodecError::InvalidArgument(error.to_string())
    }
}
