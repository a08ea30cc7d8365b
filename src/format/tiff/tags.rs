//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary shared by the reader and the writer:
//! - Field types that determine how values are encoded
//! - Tag IDs that identify metadata fields
//! - Compression identifiers
//!
//! Only baseline tags needed for stripped grayscale images are named here.

use serde::{Deserialize, Serialize};

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a specific size in bytes, which is critical for:
/// - Determining if a value fits inline in an IFD entry
/// - Reading arrays of values correctly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two Longs: numerator then denominator (8 bytes)
    Rational = 5,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Unsigned 64-bit integer (8 bytes) - BigTIFF only
    Long8 = 16,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte => 1,
            FieldType::Ascii => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Rational => 8,
            FieldType::Undefined => 1,
            FieldType::Long8 => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unsupported or unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            16 => Some(FieldType::Long8),
            _ => None,
        }
    }

    /// Get the numeric type ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Maximum bytes that can be stored inline in a classic TIFF IFD entry.
    pub const INLINE_THRESHOLD_TIFF: usize = 4;

    /// Maximum bytes that can be stored inline in a BigTIFF IFD entry.
    pub const INLINE_THRESHOLD_BIGTIFF: usize = 8;

    /// Check if a value with this type and count fits inline in a TIFF entry.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let total_size = self.size_in_bytes() as u64 * count;
        let threshold = if is_bigtiff {
            Self::INLINE_THRESHOLD_BIGTIFF as u64
        } else {
            Self::INLINE_THRESHOLD_TIFF as u64
        };
        total_size <= threshold
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs used for stripped grayscale images.
///
/// Tags not listed here are skipped on read and never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Kind of data in this subfile (bit 1 = page of a multi-page document)
    NewSubfileType = 254,

    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample (16 for this codec)
    BitsPerSample = 258,

    /// Compression scheme used
    Compression = 259,

    /// Photometric interpretation (MinIsBlack, MinIsWhite, ...)
    PhotometricInterpretation = 262,

    /// Bit order within each byte
    FillOrder = 266,

    /// Row 0 / column 0 placement
    Orientation = 274,

    /// Number of components per pixel (1 for grayscale)
    SamplesPerPixel = 277,

    /// How components are organized (chunky vs planar)
    PlanarConfiguration = 284,

    // -------------------------------------------------------------------------
    // Strip Organization
    // -------------------------------------------------------------------------
    /// Byte offsets of strips
    StripOffsets = 273,

    /// Row count per strip
    RowsPerStrip = 278,

    /// Byte counts of strips
    StripByteCounts = 279,

    // -------------------------------------------------------------------------
    // Tile Organization (detected and rejected)
    // -------------------------------------------------------------------------
    /// Width of each tile in pixels
    TileWidth = 322,

    /// Height (length) of each tile in pixels
    TileLength = 323,

    // -------------------------------------------------------------------------
    // Resolution and paging
    // -------------------------------------------------------------------------
    /// Pixels per unit in X direction
    XResolution = 282,

    /// Pixels per unit in Y direction
    YResolution = 283,

    /// Unit of resolution (1=none, 2=inch, 3=centimeter)
    ResolutionUnit = 296,

    /// Page index and total page count
    PageNumber = 297,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags. Unknown tags are not an error;
    /// they are simply ignored during parsing.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            254 => Some(TiffTag::NewSubfileType),
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            262 => Some(TiffTag::PhotometricInterpretation),
            266 => Some(TiffTag::FillOrder),
            273 => Some(TiffTag::StripOffsets),
            274 => Some(TiffTag::Orientation),
            277 => Some(TiffTag::SamplesPerPixel),
            278 => Some(TiffTag::RowsPerStrip),
            279 => Some(TiffTag::StripByteCounts),
            282 => Some(TiffTag::XResolution),
            283 => Some(TiffTag::YResolution),
            284 => Some(TiffTag::PlanarConfiguration),
            296 => Some(TiffTag::ResolutionUnit),
            297 => Some(TiffTag::PageNumber),
            322 => Some(TiffTag::TileWidth),
            323 => Some(TiffTag::TileLength),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Tag name for error messages.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::NewSubfileType => "NewSubfileType",
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::BitsPerSample => "BitsPerSample",
            TiffTag::Compression => "Compression",
            TiffTag::PhotometricInterpretation => "PhotometricInterpretation",
            TiffTag::FillOrder => "FillOrder",
            TiffTag::Orientation => "Orientation",
            TiffTag::SamplesPerPixel => "SamplesPerPixel",
            TiffTag::PlanarConfiguration => "PlanarConfiguration",
            TiffTag::StripOffsets => "StripOffsets",
            TiffTag::RowsPerStrip => "RowsPerStrip",
            TiffTag::StripByteCounts => "StripByteCounts",
            TiffTag::TileWidth => "TileWidth",
            TiffTag::TileLength => "TileLength",
            TiffTag::XResolution => "XResolution",
            TiffTag::YResolution => "YResolution",
            TiffTag::ResolutionUnit => "ResolutionUnit",
            TiffTag::PageNumber => "PageNumber",
        }
    }
}

/// NewSubfileType bit marking a page of a multi-page document.
pub const SUBFILE_TYPE_PAGE: u32 = 0x2;

// =============================================================================
// Compression Values
// =============================================================================

/// TIFF compression scheme identifiers.
///
/// Only uncompressed data (value 1) can be read or written. Other schemes
/// are recognized so errors can name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum Compression {
    /// No compression
    None = 1,

    /// CCITT modified Huffman RLE
    CcittRle = 2,

    /// LZW compression
    Lzw = 5,

    /// "Old-style" JPEG
    OldJpeg = 6,

    /// JPEG compression
    Jpeg = 7,

    /// Deflate/zlib compression
    Deflate = 8,

    /// Macintosh RLE
    PackBits = 32773,

    /// Adobe Deflate
    AdobeDeflate = 32946,
}

impl Compression {
    /// Create a Compression from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            2 => Some(Compression::CcittRle),
            5 => Some(Compression::Lzw),
            6 => Some(Compression::OldJpeg),
            7 => Some(Compression::Jpeg),
            8 => Some(Compression::Deflate),
            32773 => Some(Compression::PackBits),
            32946 => Some(Compression::AdobeDeflate),
            _ => None,
        }
    }

    /// Get the numeric compression ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if this compression scheme is supported.
    #[inline]
    pub const fn is_supported(self) -> bool {
        matches!(self, Compression::None)
    }

    /// Get a human-readable name for the compression scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::CcittRle => "CCITT RLE",
            Compression::Lzw => "LZW",
            Compression::OldJpeg => "Old JPEG",
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "Deflate",
            Compression::PackBits => "PackBits",
            Compression::AdobeDeflate => "Adobe Deflate",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
