//! Per-page descriptive metadata.
//!
//! [`TiffMetadataSet`] is the single configuration value handed to the
//! writer and the record of what a read directory declared. Every field has
//! a documented default, so a partially specified set (for example a JSON
//! document with only `x_resolution`) is still complete.

use serde::{Deserialize, Serialize};

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::Ifd;
use super::tags::{Compression, TiffTag, SUBFILE_TYPE_PAGE};
use super::values::ValueReader;

// =============================================================================
// Enumerated tag values
// =============================================================================

/// Unit for XResolution / YResolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionUnit {
    /// No meaningful units
    None = 1,
    /// Pixels per inch
    Inch = 2,
    /// Pixels per centimeter
    Centimeter = 3,
}

impl ResolutionUnit {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(ResolutionUnit::None),
            2 => Some(ResolutionUnit::Inch),
            3 => Some(ResolutionUnit::Centimeter),
            _ => None,
        }
    }
}

/// Placement of row 0 and column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Row 0 top, column 0 left
    TopLeft = 1,
    /// Row 0 top, column 0 right
    TopRight = 2,
    /// Row 0 bottom, column 0 right
    BottomRight = 3,
    /// Row 0 bottom, column 0 left
    BottomLeft = 4,
    /// Row 0 left, column 0 top
    LeftTop = 5,
    /// Row 0 right, column 0 top
    RightTop = 6,
    /// Row 0 right, column 0 bottom
    RightBottom = 7,
    /// Row 0 left, column 0 bottom
    LeftBottom = 8,
}

impl Orientation {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Orientation::TopLeft),
            2 => Some(Orientation::TopRight),
            3 => Some(Orientation::BottomRight),
            4 => Some(Orientation::BottomLeft),
            5 => Some(Orientation::LeftTop),
            6 => Some(Orientation::RightTop),
            7 => Some(Orientation::RightBottom),
            8 => Some(Orientation::LeftBottom),
            _ => None,
        }
    }
}

/// Storage of multi-sample pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarConfig {
    /// Not initialized
    Unknown = 0,
    /// Samples interleaved in a single plane
    Contiguous = 1,
    /// One plane per sample
    Separate = 2,
}

impl PlanarConfig {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(PlanarConfig::Unknown),
            1 => Some(PlanarConfig::Contiguous),
            2 => Some(PlanarConfig::Separate),
            _ => None,
        }
    }
}

/// Photometric interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Photometric {
    /// Minimum value is white
    MinIsWhite = 0,
    /// Minimum value is black
    MinIsBlack = 1,
    /// RGB color model
    Rgb = 2,
    /// Color map indexed
    Palette = 3,
    /// Holdout mask
    Mask = 4,
    /// Color separations
    Separated = 5,
    /// CCIR 601
    YCbCr = 6,
    /// 1976 CIE L*a*b*
    CieLab = 8,
    /// ICC L*a*b*
    IccLab = 9,
    /// ITU L*a*b*
    ItuLab = 10,
    /// CIE Log2(L)
    LogL = 32844,
    /// CIE Log2(L) (u',v')
    LogLuv = 32845,
}

impl Photometric {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Photometric::MinIsWhite),
            1 => Some(Photometric::MinIsBlack),
            2 => Some(Photometric::Rgb),
            3 => Some(Photometric::Palette),
            4 => Some(Photometric::Mask),
            5 => Some(Photometric::Separated),
            6 => Some(Photometric::YCbCr),
            8 => Some(Photometric::CieLab),
            9 => Some(Photometric::IccLab),
            10 => Some(Photometric::ItuLab),
            32844 => Some(Photometric::LogL),
            32845 => Some(Photometric::LogLuv),
            _ => None,
        }
    }

    /// Whether samples map to gray intensity.
    pub const fn is_grayscale(self) -> bool {
        matches!(self, Photometric::MinIsBlack | Photometric::MinIsWhite)
    }
}

/// Bit order within each byte of pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOrder {
    /// Most significant bit first
    Msb2Lsb = 1,
    /// Least significant bit first
    Lsb2Msb = 2,
}

impl FillOrder {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FillOrder::Msb2Lsb),
            2 => Some(FillOrder::Lsb2Msb),
            _ => None,
        }
    }
}

// =============================================================================
// TiffMetadataSet
// =============================================================================

/// Default horizontal and vertical resolution.
pub const DEFAULT_RESOLUTION: f32 = 72.0;

/// Paging information read from a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Zero-based page index
    pub index: u16,
    /// Total number of pages, 0 if unknown
    pub total: u16,
}

/// Descriptive fields written to, and read from, every TIFF directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiffMetadataSet {
    pub x_resolution: f32,
    pub y_resolution: f32,
    pub resolution_unit: ResolutionUnit,
    pub orientation: Orientation,
    pub planar_config: PlanarConfig,
    pub photometric: Photometric,
    pub compression: Compression,
    pub fill_order: FillOrder,

    /// Sample depth; the codec only encodes and decodes 16
    pub bits_per_sample: u16,

    /// Samples per pixel; 1 for grayscale
    pub samples_per_pixel: u16,

    /// Rows per strip; `None` writes the whole image as one strip
    pub rows_per_strip: Option<u32>,

    /// Paging tags found on read. The writer derives these itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
}

impl Default for TiffMetadataSet {
    fn default() -> Self {
        Self {
            x_resolution: DEFAULT_RESOLUTION,
            y_resolution: DEFAULT_RESOLUTION,
            resolution_unit: ResolutionUnit::Inch,
            orientation: Orientation::TopLeft,
            planar_config: PlanarConfig::Contiguous,
            photometric: Photometric::MinIsBlack,
            compression: Compression::None,
            fill_order: FillOrder::Msb2Lsb,
            bits_per_sample: 16,
            samples_per_pixel: 1,
            rows_per_strip: None,
            page: None,
        }
    }
}

fn invalid(tag: TiffTag, value: impl std::fmt::Display) -> TiffError {
    TiffError::InvalidTagValue {
        tag: tag.name(),
        message: format!("unrecognized value {}", value),
    }
}

impl TiffMetadataSet {
    /// Populate a metadata set from a directory's tags.
    ///
    /// Absent tags take the TIFF baseline default (or this crate's default
    /// where TIFF has none, e.g. resolution). Unrecognized enumerated values
    /// are rejected. `BitsPerSample` must hold one depth, or the same depth
    /// once per sample.
    pub fn from_ifd<R: RangeReader + ?Sized>(
        ifd: &Ifd,
        values: &ValueReader<'_, R>,
    ) -> Result<Self, TiffError> {
        let defaults = Self::default();

        let read_u16 = |tag: TiffTag| -> Result<Option<u16>, TiffError> {
            match ifd.get_entry_by_tag(tag) {
                Some(entry) => {
                    let value = values.read_u32(entry, tag.name())?;
                    u16::try_from(value).map(Some).map_err(|_| invalid(tag, value))
                }
                None => Ok(None),
            }
        };
        let read_resolution = |tag: TiffTag| -> Result<f32, TiffError> {
            match ifd.get_entry_by_tag(tag) {
                Some(entry) => Ok(values.read_rational(entry, tag.name())? as f32),
                None => Ok(DEFAULT_RESOLUTION),
            }
        };

        let compression = match read_u16(TiffTag::Compression)? {
            Some(raw) => Compression::from_u16(raw)
                .ok_or_else(|| TiffError::UnsupportedCompression(format!("Unknown ({})", raw)))?,
            None => Compression::None,
        };

        let photometric = match read_u16(TiffTag::PhotometricInterpretation)? {
            Some(raw) => Photometric::from_u16(raw)
                .ok_or_else(|| invalid(TiffTag::PhotometricInterpretation, raw))?,
            None => defaults.photometric,
        };

        let orientation = match read_u16(TiffTag::Orientation)? {
            Some(raw) => Orientation::from_u16(raw).ok_or_else(|| invalid(TiffTag::Orientation, raw))?,
            None => defaults.orientation,
        };

        let planar_config = match read_u16(TiffTag::PlanarConfiguration)? {
            Some(raw) => PlanarConfig::from_u16(raw)
                .ok_or_else(|| invalid(TiffTag::PlanarConfiguration, raw))?,
            None => defaults.planar_config,
        };

        let fill_order = match read_u16(TiffTag::FillOrder)? {
            Some(raw) => FillOrder::from_u16(raw).ok_or_else(|| invalid(TiffTag::FillOrder, raw))?,
            None => defaults.fill_order,
        };

        let resolution_unit = match read_u16(TiffTag::ResolutionUnit)? {
            Some(raw) => ResolutionUnit::from_u16(raw)
                .ok_or_else(|| invalid(TiffTag::ResolutionUnit, raw))?,
            None => defaults.resolution_unit,
        };

        let samples_per_pixel = read_u16(TiffTag::SamplesPerPixel)?.unwrap_or(1);

        // TIFF baseline default for BitsPerSample is 1
        let bits_per_sample = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
            Some(entry) => {
                let depths = values.read_u32_array(entry, TiffTag::BitsPerSample.name())?;
                if depths.len() != 1 && depths.len() != usize::from(samples_per_pixel) {
                    return Err(TiffError::InvalidTagValue {
                        tag: TiffTag::BitsPerSample.name(),
                        message: format!(
                            "{} depths for {} samples per pixel",
                            depths.len(),
                            samples_per_pixel
                        ),
                    });
                }
                let first = depths.first().copied().unwrap_or(1);
                if depths.iter().any(|&d| d != first) {
                    return Err(TiffError::InvalidTagValue {
                        tag: TiffTag::BitsPerSample.name(),
                        message: format!("mixed sample depths {:?}", depths),
                    });
                }
                u16::try_from(first).map_err(|_| invalid(TiffTag::BitsPerSample, first))?
            }
            None => 1,
        };

        let rows_per_strip = match ifd.get_entry_by_tag(TiffTag::RowsPerStrip) {
            Some(entry) => Some(values.read_u32(entry, TiffTag::RowsPerStrip.name())?),
            None => None,
        };

        let is_page = match ifd.get_entry_by_tag(TiffTag::NewSubfileType) {
            Some(entry) => {
                values.read_u32(entry, TiffTag::NewSubfileType.name())? & SUBFILE_TYPE_PAGE != 0
            }
            None => false,
        };
        let page = match ifd.get_entry_by_tag(TiffTag::PageNumber) {
            Some(entry) => {
                let pair = values.read_u32_array(entry, TiffTag::PageNumber.name())?;
                match pair.as_slice() {
                    [index, total] => Some(PageInfo {
                        index: u16::try_from(*index)
                            .map_err(|_| invalid(TiffTag::PageNumber, index))?,
                        total: u16::try_from(*total)
                            .map_err(|_| invalid(TiffTag::PageNumber, total))?,
                    }),
                    _ => return Err(invalid(TiffTag::PageNumber, format!("{:?}", pair))),
                }
            }
            None if is_page => Some(PageInfo { index: 0, total: 0 }),
            None => None,
        };

        Ok(Self {
            x_resolution: read_resolution(TiffTag::XResolution)?,
            y_resolution: read_resolution(TiffTag::YResolution)?,
            resolution_unit,
            orientation,
            planar_config,
            photometric,
            compression,
            fill_order,
            bits_per_sample,
            samples_per_pixel,
            rows_per_strip,
            page,
        })
    }

    /// Check that this set describes something the writer can encode.
    pub fn check_writable(&self) -> Result<(), String> {
        if !self.compression.is_supported() {
            return Err(format!(
                "compression {} is not supported for writing",
                self.compression.name()
            ));
        }
        if self.bits_per_sample != 16 {
            return Err(format!(
                "bits_per_sample must be 16, got {}",
                self.bits_per_sample
            ));
        }
        if self.samples_per_pixel == 0 {
            return Err("samples_per_pixel must be at least 1".to_string());
        }
        match self.planar_config {
            PlanarConfig::Contiguous => {}
            PlanarConfig::Separate if self.samples_per_pixel == 1 => {}
            other => {
                return Err(format!(
                    "planar_config {:?} cannot be written for {} sample(s) per pixel",
                    other, self.samples_per_pixel
                ))
            }
        }
        for (name, value) in [("x_resolution", self.x_resolution), ("y_resolution", self.y_resolution)] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite, non-negative number", name));
            }
            if value >= MAX_RESOLUTION {
                return Err(format!("{} {} does not fit a 32-bit rational", name, value));
            }
        }
        if self.rows_per_strip == Some(0) {
            return Err("rows_per_strip must be positive".to_string());
        }
        Ok(())
    }
}

/// Smallest resolution that no longer fits a rational numerator (2^32).
const MAX_RESOLUTION: f32 = 4_294_967_296.0;

/// Encode a resolution as a TIFF rational.
///
/// Integral values are stored exactly; others keep four decimal places.
pub fn to_rational(value: f32) -> (u32, u32) {
    if value.fract() == 0.0 && value < MAX_RESOLUTION {
        return (value as u32, 1);
    }
    let denominator = 10_000u64;
    let numerator = (value as f64 * denominator as f64).round() as u64;
    let divisor = gcd(numerator, denominator).max(1);
    let (mut n, mut d) = (numerator / divisor, denominator / divisor);
    while n > u32::MAX as u64 && d > 1 {
        n /= 10;
        d /= 10;
    }
    (u32::try_from(n).unwrap_or(u32::MAX), d as u32)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
