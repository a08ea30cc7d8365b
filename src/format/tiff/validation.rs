//! Directory validation for the supported TIFF subset.
//!
//! Files outside the subset are rejected before any pixel data is read.
//!
//! # Supported Subset
//!
//! - **Organization**: Strips only (no tiles)
//! - **Compression**: None
//! - **Sample depth**: 16 bits
//! - **Planar configuration**: Contiguous, or any value with one sample per pixel
//! - **Format**: Standard TIFF or BigTIFF, either byte order
//!
//! Bit-reversed fill order and multi-strip layouts are accepted and
//! reported as warnings.

use crate::error::TiffError;

use super::metadata::{FillOrder, PlanarConfig, TiffMetadataSet};
use super::parser::Ifd;
use super::tags::TiffTag;

// =============================================================================
// Validation Result
// =============================================================================

/// Result of validating one directory.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the directory can be decoded
    pub is_valid: bool,

    /// Validation errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// Non-fatal observations
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a successful validation result.
    pub fn ok() -> Self {
        ValidationResult {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Convert to a TiffError if invalid.
    ///
    /// Returns the first error as a TiffError, or Ok(()) if valid.
    pub fn into_result(self) -> Result<(), TiffError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

/// A specific validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Directory stores tiles instead of strips
    TiledOrganization {
        /// Index of the offending directory
        ifd_index: usize,
    },

    /// Missing required strip or geometry tags
    MissingTags {
        /// Index of the offending directory
        ifd_index: usize,
        /// Which tags are missing
        missing_tags: Vec<&'static str>,
    },

    /// Compression other than None
    UnsupportedCompression {
        /// Index of the offending directory
        ifd_index: usize,
        /// Human-readable compression name
        compression_name: String,
    },

    /// Sample depth other than 16
    UnsupportedBitDepth {
        /// Index of the offending directory
        ifd_index: usize,
        /// The depth found
        bits_per_sample: u16,
    },

    /// Zero samples per pixel
    InvalidSampleCount {
        /// Index of the offending directory
        ifd_index: usize,
    },

    /// Separate planes with more than one sample per pixel
    UnsupportedPlanarConfig {
        /// Index of the offending directory
        ifd_index: usize,
        /// The raw planar configuration value
        planar_config: u16,
    },
}

impl From<ValidationError> for TiffError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::TiledOrganization { .. } => TiffError::TiledOrganization,
            ValidationError::MissingTags { missing_tags, .. } => {
                TiffError::MissingTag(missing_tags.first().copied().unwrap_or("StripOffsets"))
            }
            ValidationError::UnsupportedCompression {
                compression_name, ..
            } => TiffError::UnsupportedCompression(compression_name),
            ValidationError::UnsupportedBitDepth {
                bits_per_sample, ..
            } => TiffError::UnsupportedBitDepth(bits_per_sample),
            ValidationError::InvalidSampleCount { .. } => TiffError::InvalidTagValue {
                tag: TiffTag::SamplesPerPixel.name(),
                message: "must be at least 1".to_string(),
            },
            ValidationError::UnsupportedPlanarConfig { planar_config, .. } => {
                TiffError::UnsupportedPlanarConfig(planar_config)
            }
        }
    }
}

// =============================================================================
// Structural checks
// =============================================================================

/// Check the directory's storage layout before its values are decoded.
///
/// Tiles are rejected outright; otherwise every tag needed to locate pixel
/// data must be present.
pub fn check_layout(ifd: &Ifd, ifd_index: usize) -> ValidationResult {
    let mut result = ValidationResult::ok();

    if ifd.is_tiled() {
        result.add_error(ValidationError::TiledOrganization { ifd_index });
        return result;
    }

    let missing_tags: Vec<&'static str> = [
        TiffTag::ImageWidth,
        TiffTag::ImageLength,
        TiffTag::StripOffsets,
        TiffTag::StripByteCounts,
    ]
    .into_iter()
    .filter(|tag| ifd.get_entry_by_tag(*tag).is_none())
    .map(TiffTag::name)
    .collect();

    if !missing_tags.is_empty() {
        result.add_error(ValidationError::MissingTags {
            ifd_index,
            missing_tags,
        });
    }

    result
}

// =============================================================================
// Metadata checks
// =============================================================================

/// Check decoded metadata against what the reader can decode.
pub fn check_metadata(metadata: &TiffMetadataSet, ifd_index: usize) -> ValidationResult {
    let mut result = ValidationResult::ok();

    if !metadata.compression.is_supported() {
        result.add_error(ValidationError::UnsupportedCompression {
            ifd_index,
            compression_name: metadata.compression.name().to_string(),
        });
    }

    if metadata.bits_per_sample != 16 {
        result.add_error(ValidationError::UnsupportedBitDepth {
            ifd_index,
            bits_per_sample: metadata.bits_per_sample,
        });
    }

    if metadata.samples_per_pixel == 0 {
        result.add_error(ValidationError::InvalidSampleCount { ifd_index });
    }

    if metadata.samples_per_pixel > 1 && metadata.planar_config == PlanarConfig::Separate {
        result.add_error(ValidationError::UnsupportedPlanarConfig {
            ifd_index,
            planar_config: PlanarConfig::Separate as u16,
        });
    }

    if metadata.fill_order == FillOrder::Lsb2Msb {
        result.add_warning(format!(
            "IFD {}: LSB-to-MSB fill order, pixel bytes will be bit-reversed",
            ifd_index
        ));
    }

    result
}

/// Record a warning when the pixel data spans several strips.
pub fn check_strip_count(result: &mut ValidationResult, strip_count: usize, ifd_index: usize) {
    if strip_count > 1 {
        result.add_warning(format!(
            "IFD {}: pixel data spans {} strips",
            ifd_index, strip_count
        ));
    }
}

/// Run every check for one directory.
pub fn validate_directory(
    ifd: &Ifd,
    metadata: &TiffMetadataSet,
    ifd_index: usize,
) -> ValidationResult {
    let mut result = check_layout(ifd, ifd_index);
    if !result.is_valid {
        return result;
    }

    let metadata_result = check_metadata(metadata, ifd_index);
    for error in metadata_result.errors {
        result.add_error(error);
    }
    result.warnings.extend(metadata_result.warnings);

    result
}

// =============================================================================
// Tests
// =============================================================================
