use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use seminal_root_angle_lib::{extract_all_angles, Config};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Seminal root angle extraction from root and seed segmentations")]
struct Args {
    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory of seed location segmentations
    #[clap(long)]
    seed_seg_dir: Option<PathBuf>,

    /// Directory of root segmentations
    #[clap(long)]
    root_seg_dir: Option<PathBuf>,

    /// Directory of original photographs
    #[clap(long)]
    photo_dir: Option<PathBuf>,

    /// Results CSV
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Errors CSV
    #[clap(short, long)]
    errors: Option<PathBuf>,

    /// Directory for debug composites
    #[clap(long)]
    debug_dir: Option<PathBuf>,

    #[clap(long)]
    inner_radius: Option<u32>,

    #[clap(long)]
    outer_radius: Option<u32>,

    /// Maximum seeds measured per image
    #[clap(long)]
    max_seeds: Option<usize>,

    /// Save a debug composite for every seed
    #[clap(short, long)]
    debug_images: bool,

    /// Process images one after another
    #[clap(long)]
    sequential: bool,

    #[clap(long)]
    workers: Option<usize>,

    #[clap(long)]
    chunk_size: Option<usize>,

    /// Keep going when an image cannot be processed
    #[clap(long)]
    continue_on_error: bool,

    /// Debug logging
    #[clap(short, long)]
    verbose: bool,

    /// Write the effective configuration to this path and exit
    #[clap(long)]
    write_default_config: Option<PathBuf>,
}

fn load_config(path: &Path) -> Result<Config> {
    if path.is_file() {
        Config::from_file(path).with_context(|| format!("loading {}", path.display()))
    } else {
        warn!("{} not found, using default configuration", path.display());
        Ok(Config::default())
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(dir) = &args.seed_seg_dir {
        config.seed_seg_dir = dir.clone();
    }
    if let Some(dir) = &args.root_seg_dir {
        config.root_seg_dir = dir.clone();
    }
    if let Some(dir) = &args.photo_dir {
        config.photo_dir = dir.clone();
    }
    if let Some(path) = &args.output {
        config.output_csv_path = path.clone();
    }
    if let Some(path) = &args.errors {
        config.error_csv_path = path.clone();
    }
    if let Some(dir) = &args.debug_dir {
        config.debug_image_dir = dir.clone();
    }
    if let Some(r) = args.inner_radius {
        config.inner_radius = r;
    }
    if let Some(r) = args.outer_radius {
        config.outer_radius = r;
    }
    if let Some(n) = args.max_seeds {
        config.max_seed_points_per_image = n;
    }
    if args.debug_images {
        config.save_debug_images = true;
    }
    if args.sequential {
        config.use_parallel = false;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.chunk_size.is_some() {
        config.chunk_size = args.chunk_size;
    }
    if args.continue_on_error {
        config.abort_on_file_error = false;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = load_config(&args.config)?;
    apply_overrides(&mut config, &args);

    if let Some(path) = &args.write_default_config {
        config
            .save_to_file(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let summary = extract_all_angles(&config).context("angle extraction failed")?;

    info!(
        "Wrote {} angles to {} and {} errors to {}",
        summary.results,
        config.output_csv_path.display(),
        summary.errors,
        config.error_csv_path.display()
    );

    Ok(())
}
