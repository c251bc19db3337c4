use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RootAngleError, Result};

/// Configuration for the root angle extractor
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Seed location segmentations (RGBA, mask in alpha). Drives file enumeration.
    pub seed_seg_dir: PathBuf,
    /// Root segmentations with the same file names as the seed segmentations
    pub root_seg_dir: PathBuf,
    /// Original photographs
    pub photo_dir: PathBuf,
    pub output_csv_path: PathBuf,
    pub error_csv_path: PathBuf,
    pub debug_image_dir: PathBuf,

    #[serde(default = "default_max_seed_points_per_image")]
    pub max_seed_points_per_image: usize,

    // Radii are in pixels of the root segmentation
    #[serde(default = "default_inner_radius")]
    pub inner_radius: u32,

    #[serde(default = "default_outer_radius")]
    pub outer_radius: u32,

    #[serde(default)]
    pub save_debug_images: bool,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    /// Worker pool size, CPU count when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Images per progress chunk, everything in one chunk when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    // Seed regions must be strictly larger than this
    #[serde(default = "default_min_seed_pixels")]
    pub min_seed_pixels: usize,

    // Skeleton components smaller than this are dropped
    #[serde(default = "default_min_skeleton_object_size")]
    pub min_skeleton_object_size: usize,

    #[serde(default = "default_abort_on_file_error")]
    pub abort_on_file_error: bool,
}

fn default_max_seed_points_per_image() -> usize {
    2
}

fn default_inner_radius() -> u32 {
    220
}

fn default_outer_radius() -> u32 {
    300
}

fn default_parallel() -> bool {
    true
}

fn default_min_seed_pixels() -> usize {
    100
}

fn default_min_skeleton_object_size() -> usize {
    30
}

fn default_abort_on_file_error() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_seg_dir: PathBuf::from("./seed_segmentations"),
            root_seg_dir: PathBuf::from("./root_segmentations"),
            photo_dir: PathBuf::from("./photos"),
            output_csv_path: PathBuf::from("./angles.csv"),
            error_csv_path: PathBuf::from("./errors.csv"),
            debug_image_dir: PathBuf::from("./debug_images"),
            max_seed_points_per_image: default_max_seed_points_per_image(),
            inner_radius: default_inner_radius(),
            outer_radius: default_outer_radius(),
            save_debug_images: false,
            use_parallel: default_parallel(),
            workers: None,
            chunk_size: None,
            min_seed_pixels: default_min_seed_pixels(),
            min_skeleton_object_size: default_min_skeleton_object_size(),
            abort_on_file_error: default_abort_on_file_error(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RootAngleError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| RootAngleError::ConfigLoad {
            source: e,
            path: path.to_path_buf(),
        })
    }

    /// Check the numeric parameters. Runs before any image is touched.
    pub fn validate_parameters(&self) -> Result<()> {
        if self.outer_radius <= self.inner_radius {
            return Err(RootAngleError::Config(format!(
                "outer_radius ({}) must be bigger than inner_radius ({})",
                self.outer_radius, self.inner_radius
            )));
        }

        if self.max_seed_points_per_image == 0 {
            return Err(RootAngleError::Config(
                "max_seed_points_per_image must be >= 1".to_string(),
            ));
        }

        if self.workers == Some(0) {
            return Err(RootAngleError::Config("workers must be > 0".to_string()));
        }

        if self.chunk_size == Some(0) {
            return Err(RootAngleError::Config("chunk_size must be > 0".to_string()));
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_parameters()?;

        for dir in [&self.seed_seg_dir, &self.root_seg_dir, &self.photo_dir] {
            if !dir.is_dir() {
                return Err(RootAngleError::InvalidPath(dir.clone()));
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            RootAngleError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}
