use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for the root angle extractor
#[derive(Error, Debug)]
pub enum RootAngleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("could not find photo for {file} in {dir}")]
    MissingPhoto {
        file: String,
        dir: PathBuf,
    },

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Could not build worker pool: {0}")]
    ThreadPool(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Failures local to one seed. The display text is what lands in the errors table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("could not find two roots in local region")]
    InsufficientRootCandidates,

    #[error("angle computation failed: root candidate coincides with seed point")]
    DegenerateGeometry,
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, RootAngleError>;
