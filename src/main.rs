//! tiff-slicer - Slice and preview 16-bit grayscale TIFF images.
//!
//! This binary wires the codec to the command line and installs logging.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiff_slicer::{
    config::{Cli, Command, InfoConfig, PreviewConfig, SliceConfig},
    encode_jpeg, is_tiff_header, slice_page, write_many, write_one, CodecError, Page,
    RemainderPolicy, TiffMetadataSet, TiffReader,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Info(config) => run_info(config),
        Command::Slice(config) => run_slice(config).await,
        Command::Preview(config) => run_preview(config),
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tiff_slicer=debug"
    } else {
        "tiff_slicer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Info Command
// =============================================================================

#[derive(Debug, Serialize)]
struct PageSummary {
    index: usize,
    width: u32,
    height: u32,
    strips: usize,
    supported: bool,
    warnings: Vec<String>,
    metadata: TiffMetadataSet,
}

fn summarize(path: &Path) -> Result<Vec<PageSummary>, CodecError> {
    let reader = TiffReader::open(path)?;
    (0..reader.directory_count())
        .map(|index| {
            let layout = reader.layout(index)?;
            let validation = reader.validate(index)?;
            Ok(PageSummary {
                index,
                width: layout.width,
                height: layout.height,
                strips: layout.strip_offsets.len(),
                supported: validation.is_valid,
                warnings: validation.warnings,
                metadata: reader.metadata(index)?,
            })
        })
        .collect()
}

fn run_info(config: InfoConfig) -> ExitCode {
    init_logging(config.verbose);

    let pages = match summarize(&config.path) {
        Ok(pages) => pages,
        Err(e) => {
            error!("{}: {}", config.path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        match serde_json::to_string_pretty(&pages) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize page summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{}", config.path.display());
    if pages.is_empty() {
        println!("  (no directories)");
    }
    for page in &pages {
        let m = &page.metadata;
        println!(
            "  [{}] {}x{}  {} bit x {}  {:?}  {} strip(s)  res {}x{} {:?}{}",
            page.index,
            page.width,
            page.height,
            m.bits_per_sample,
            m.samples_per_pixel,
            m.photometric,
            page.strips,
            m.x_resolution,
            m.y_resolution,
            m.resolution_unit,
            if page.supported { "" } else { "  (unsupported)" }
        );
        for warning in &page.warnings {
            println!("      warning: {}", warning);
        }
    }
    ExitCode::SUCCESS
}

// =============================================================================
// Slice Command
// =============================================================================

/// Expand directories into the TIFF files they directly contain.
fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let entries = match std::fs::read_dir(input) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping {}: {}", input.display(), e);
                continue;
            }
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_tiff_signature(path))
            .collect();
        found.sort();
        debug!("Found {} TIFF file(s) in {}", found.len(), input.display());
        files.extend(found);
    }
    files
}

fn has_tiff_signature(path: &Path) -> bool {
    use std::io::Read;

    let mut signature = [0u8; 4];
    std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut signature))
        .map(|_| is_tiff_header(&signature))
        .unwrap_or(false)
}

/// Slice one input and write its slices; returns the paths written.
fn slice_one(
    input: &Path,
    count: u32,
    policy: RemainderPolicy,
    output_dir: &Path,
    multipage: bool,
    metadata: Option<&TiffMetadataSet>,
) -> Result<Vec<PathBuf>, CodecError> {
    let reader = TiffReader::open(input)?;
    if reader.directory_count() == 0 {
        warn!("{} has no directories", input.display());
        return Ok(Vec::new());
    }

    let mut page = reader.read_page(0)?;
    if let Some(metadata) = metadata {
        page.metadata = TiffMetadataSet {
            samples_per_pixel: page.image.samples_per_pixel(),
            ..metadata.clone()
        };
    }
    let slices: Vec<Page> = slice_page(&page, count, policy)?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    if multipage {
        let path = output_dir.join(format!("{}_slices.tif", stem));
        write_many(&slices, &path)?;
        return Ok(vec![path]);
    }

    slices
        .iter()
        .enumerate()
        .map(|(i, slice)| {
            let path = output_dir.join(format!("{}_slice{}.tif", stem, i));
            write_one(slice, &path)?;
            Ok(path)
        })
        .collect()
}

async fn run_slice(config: SliceConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let metadata = match config.load_metadata() {
        Ok(metadata) => metadata.map(Arc::new),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let inputs = collect_inputs(&config.inputs);
    if inputs.is_empty() {
        error!("No input files");
        return ExitCode::FAILURE;
    }
    info!(
        "Slicing {} file(s) into {} part(s) each",
        inputs.len(),
        config.count
    );

    // Inputs are independent files, so each runs on its own blocking task
    let permits = Arc::new(Semaphore::new(config.jobs));
    let mut tasks = JoinSet::new();
    for input in inputs {
        let permits = Arc::clone(&permits);
        let metadata = metadata.clone();
        let output_dir = config.output_dir.clone();
        let (count, policy, multipage) = (config.count, config.remainder_policy(), config.multipage);

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = tokio::task::spawn_blocking({
                let input = input.clone();
                move || {
                    slice_one(
                        &input,
                        count,
                        policy,
                        &output_dir,
                        multipage,
                        metadata.as_deref(),
                    )
                }
            })
            .await;
            (input, result)
        });
    }

    let mut failures = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((input, Ok(Ok(paths)))) => {
                for path in paths {
                    info!("{} -> {}", input.display(), path.display());
                }
            }
            Ok((input, Ok(Err(e)))) => {
                error!("{}: {}", input.display(), e);
                failures += 1;
            }
            Ok((input, Err(e))) => {
                error!("{}: task failed: {}", input.display(), e);
                failures += 1;
            }
            Err(e) => {
                error!("Task failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        error!("{} input(s) failed", failures);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// =============================================================================
// Preview Command
// =============================================================================

fn preview(config: &PreviewConfig) -> Result<(), String> {
    let reader = TiffReader::open(&config.input).map_err(|e| e.to_string())?;
    let page = reader.read_page(config.page).map_err(|e| e.to_string())?;
    let buffer = page
        .to_display_buffer()
        .ok_or_else(|| format!("page {} is not grayscale and cannot be displayed", config.page))?;

    let jpeg = encode_jpeg(&buffer, config.quality).map_err(|e| e.to_string())?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| format!("{}: {}", parent.display(), e))?;
    }
    std::fs::write(&config.output, &jpeg)
        .map_err(|e| format!("{}: {}", config.output.display(), e))?;

    info!(
        "{} page {} -> {} ({}x{}, {} bytes)",
        config.input.display(),
        config.page,
        config.output.display(),
        buffer.width(),
        buffer.height(),
        jpeg.len()
    );
    Ok(())
}

fn run_preview(config: PreviewConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match preview(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
