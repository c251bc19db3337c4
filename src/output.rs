use std::fs::{self, File};
use std::path::Path;
use csv::Writer;

use crate::errors::Result;

pub const RESULT_HEADER: [&str; 6] = [
    "file_name",
    "angle_degrees",
    "seed_index",
    "seed_x",
    "seed_y",
    "seed_pixels",
];

pub const ERROR_HEADER: [&str; 6] = [
    "file_name",
    "error_message",
    "seed_index",
    "seed_x",
    "seed_y",
    "seed_pixels",
];

const NOT_AVAILABLE: &str = "NA";

/// Identifies one detected seed within an image
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRef {
    pub index: usize,
    /// Normalised (y, x)
    pub centroid: (f64, f64),
    pub pixel_count: usize,
}

/// One successfully measured seed
#[derive(Debug, Clone, PartialEq)]
pub struct AngleMeasurement {
    pub file_name: String,
    pub degrees: f64,
    pub seed: SeedRef,
}

/// One failed seed, or a failed file when `seed` is `None`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionError {
    pub file_name: String,
    pub message: String,
    pub seed: Option<SeedRef>,
}

/// All rows produced for one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageReport {
    pub file_name: String,
    pub measurements: Vec<AngleMeasurement>,
    pub errors: Vec<ExtractionError>,
}

impl ImageReport {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            ..Default::default()
        }
    }

    /// Report for an image that failed as a whole
    pub fn file_failure(file_name: &str, message: String) -> Self {
        let mut report = Self::new(file_name);
        report.errors.push(ExtractionError {
            file_name: file_name.to_string(),
            message,
            seed: None,
        });
        report
    }

    pub fn row_count(&self) -> usize {
        self.measurements.len() + self.errors.len()
    }
}

// Debug formatting keeps a trailing ".0" on whole numbers
fn float_field(value: f64) -> String {
    format!("{:?}", value)
}

impl AngleMeasurement {
    pub fn to_record(&self) -> [String; 6] {
        [
            self.file_name.clone(),
            float_field(self.degrees),
            self.seed.index.to_string(),
            float_field(self.seed.centroid.1),
            float_field(self.seed.centroid.0),
            self.seed.pixel_count.to_string(),
        ]
    }
}

impl ExtractionError {
    pub fn to_record(&self) -> [String; 6] {
        match &self.seed {
            Some(seed) => [
                self.file_name.clone(),
                self.message.clone(),
                seed.index.to_string(),
                float_field(seed.centroid.1),
                float_field(seed.centroid.0),
                seed.pixel_count.to_string(),
            ],
            None => [
                self.file_name.clone(),
                self.message.clone(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
            ],
        }
    }
}

/// Destination for the results and errors tables
pub trait RecordSink {
    fn write_measurement(&mut self, row: &AngleMeasurement) -> Result<()>;
    fn write_error(&mut self, row: &ExtractionError) -> Result<()>;

    /// Write every row of one image together
    fn write_report(&mut self, report: &ImageReport) -> Result<()> {
        for row in &report.measurements {
            self.write_measurement(row)?;
        }
        for row in &report.errors {
            self.write_error(row)?;
        }
        Ok(())
    }
}

/// CSV tables on disk. Creating the sink truncates both files and writes the headers.
pub struct CsvSink {
    results: Writer<File>,
    errors: Writer<File>,
}

impl CsvSink {
    pub fn create<P: AsRef<Path>, Q: AsRef<Path>>(results_path: P, errors_path: Q) -> Result<Self> {
        let mut results = create_table(results_path.as_ref())?;
        results.write_record(&RESULT_HEADER)?;
        results.flush()?;

        let mut errors = create_table(errors_path.as_ref())?;
        errors.write_record(&ERROR_HEADER)?;
        errors.flush()?;

        Ok(Self { results, errors })
    }
}

fn create_table(path: &Path) -> Result<Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(Writer::from_path(path)?)
}

impl RecordSink for CsvSink {
    fn write_measurement(&mut self, row: &AngleMeasurement) -> Result<()> {
        self.results.write_record(&row.to_record())?;
        self.results.flush()?;
        Ok(())
    }

    fn write_error(&mut self, row: &ExtractionError) -> Result<()> {
        self.errors.write_record(&row.to_record())?;
        self.errors.flush()?;
        Ok(())
    }
}

/// In-memory tables
#[derive(Debug, Default)]
pub struct MemorySink {
    pub measurements: Vec<AngleMeasurement>,
    pub errors: Vec<ExtractionError>,
}

impl RecordSink for MemorySink {
    fn write_measurement(&mut self, row: &AngleMeasurement) -> Result<()> {
        self.measurements.push(row.clone());
        Ok(())
    }

    fn write_error(&mut self, row: &ExtractionError) -> Result<()> {
        self.errors.push(row.clone());
        Ok(())
    }
}
