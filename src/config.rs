//! Command-line configuration for the `tiff-slicer` binary.
//!
//! Options can be given as flags or as environment variables with the
//! `TIFF_SLICER_` prefix:
//!
//! - `TIFF_SLICER_COUNT` - Number of slices (default: 2)
//! - `TIFF_SLICER_OUTPUT_DIR` - Output directory for slices (default: .)
//! - `TIFF_SLICER_METADATA` - JSON file with the metadata set to write
//! - `TIFF_SLICER_JOBS` - Files processed concurrently (default: 4)
//! - `TIFF_SLICER_JPEG_QUALITY` - Preview JPEG quality (default: 85)

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::error::CodecError;
use crate::format::tiff::TiffMetadataSet;
use crate::raster::{RemainderPolicy, DEFAULT_JPEG_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default number of slices.
pub const DEFAULT_SLICE_COUNT: u32 = 2;

/// Default number of input files processed at once.
pub const DEFAULT_JOBS: usize = 4;

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiff-slicer - Slice and preview 16-bit grayscale TIFF images.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiff-slicer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the pages of a TIFF file with their geometry and metadata.
    Info(InfoConfig),

    /// Split the first page of each input into equal-width slices.
    Slice(SliceConfig),

    /// Downsample a page to 8 bits and save it as a JPEG preview.
    Preview(PreviewConfig),
}

// =============================================================================
// info
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// TIFF file to inspect.
    pub path: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// slice
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct SliceConfig {
    /// Input TIFF files, or directories to scan for TIFF files.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Number of equal-width slices per image.
    #[arg(short, long, default_value_t = DEFAULT_SLICE_COUNT, env = "TIFF_SLICER_COUNT")]
    pub count: u32,

    /// Directory the slices are written to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "TIFF_SLICER_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Write all slices of an input as pages of one file.
    #[arg(long, default_value_t = false)]
    pub multipage: bool,

    /// Drop remainder columns instead of rejecting widths not divisible by the count.
    #[arg(long, default_value_t = false)]
    pub truncate: bool,

    /// JSON file with the metadata set written to every slice.
    ///
    /// Missing fields take their defaults. Without this option the input
    /// page's own metadata is kept.
    #[arg(long, env = "TIFF_SLICER_METADATA")]
    pub metadata: Option<PathBuf>,

    /// Number of input files processed concurrently.
    #[arg(short, long, default_value_t = DEFAULT_JOBS, env = "TIFF_SLICER_JOBS")]
    pub jobs: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl SliceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.count == 0 {
            return Err("count must be greater than 0".to_string());
        }
        if self.jobs == 0 {
            return Err("jobs must be greater than 0".to_string());
        }
        if self.inputs.iter().any(|p| p.as_os_str().is_empty()) {
            return Err("input paths must not be empty".to_string());
        }
        Ok(())
    }

    pub fn remainder_policy(&self) -> RemainderPolicy {
        if self.truncate {
            RemainderPolicy::Truncate
        } else {
            RemainderPolicy::Reject
        }
    }

    /// Load the metadata override, if one was given.
    pub fn load_metadata(&self) -> Result<Option<TiffMetadataSet>, CodecError> {
        self.metadata.as_deref().map(load_metadata_file).transpose()
    }
}

/// Read a JSON metadata set; absent fields take their defaults.
pub fn load_metadata_file(path: &Path) -> Result<TiffMetadataSet, CodecError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CodecError::NotFound(path.to_path_buf()),
        _ => CodecError::Path {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;
    serde_json::from_str(&text).map_err(|e| {
        CodecError::invalid_argument(format!("metadata file {}: {}", path.display(), e))
    })
}

// =============================================================================
// preview
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PreviewConfig {
    /// TIFF file to preview.
    pub input: PathBuf,

    /// Output JPEG path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Zero-based page to preview.
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// JPEG quality (1-100).
    #[arg(short, long, default_value_t = DEFAULT_JPEG_QUALITY, env = "TIFF_SLICER_JPEG_QUALITY")]
    pub quality: u8,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl PreviewConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.quality == 0 || self.quality > 100 {
            return Err("quality must be between 1 and 100".to_string());
        }
        if self.output.as_os_str().is_empty() {
            return Err("output path must not be empty".to_string());
        }
        Ok(())
    }
}
