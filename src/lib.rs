// src/lib.rs - Library interface for the seminal root angle extractor

pub mod angle;
pub mod annulus;
pub mod batch;
pub mod config;
pub mod debug_image;
pub mod errors;
pub mod image_io;
pub mod image_utils;
pub mod morphology;
pub mod output;
pub mod parallel;
pub mod pipeline;
pub mod point_analysis;
pub mod regions;

// Re-export commonly used types and functions
pub use errors::{RootAngleError, Result, SeedError};
pub use config::Config;
pub use batch::{extract_all_angles, run_batch, BatchSummary};
pub use pipeline::{measure_seed, process_image, AnnulusParams};
pub use output::{AngleMeasurement, CsvSink, ExtractionError, ImageReport, MemorySink, RecordSink};
pub use parallel::{run_chunked, ExecutorOptions};

// Re-export the geometry building blocks
pub use point_analysis::{detect_seed_points, SeedPoint};
pub use morphology::{root_skeleton, skeletonize, remove_small_objects};
pub use annulus::{annulus_mask, isolate_annulus, select_root_candidates, RootCandidates};
pub use angle::{angle_at_vertex, emergence_angle};
pub use regions::{label_regions, ConnectedRegion};
pub use image_utils::fit_seed_mask;
