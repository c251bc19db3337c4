use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::Config;
use crate::errors::{RootAngleError, Result};
use crate::image_io::list_segmentation_files;
use crate::output::{CsvSink, ImageReport, RecordSink};
use crate::parallel::{run_chunked, ExecutorOptions};
use crate::pipeline::process_image;

/// Totals for one batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub files: usize,
    pub results: usize,
    pub errors: usize,
    pub failed_files: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn add(&mut self, report: &ImageReport, file_failed: bool) {
        self.files += 1;
        self.results += report.measurements.len();
        self.errors += report.errors.len();
        if file_failed {
            self.failed_files += 1;
        }
    }
}

/// Process every segmentation file and write the CSV tables named in `config`
pub fn extract_all_angles(config: &Config) -> Result<BatchSummary> {
    config.validate()?;
    let mut sink = CsvSink::create(&config.output_csv_path, &config.error_csv_path)?;
    run_batch(config, &mut sink, process_image)
}

/// Drive `process` over all segmentation files, writing rows to `sink`.
///
/// A file-level failure is recorded as an error row with `NA` seed fields.
/// With `abort_on_file_error` the batch then stops with that error; in the
/// parallel mode files already in flight still finish and are recorded first.
pub fn run_batch<S, F>(config: &Config, sink: &mut S, process: F) -> Result<BatchSummary>
where
    S: RecordSink + ?Sized,
    F: Fn(&str, &Config) -> Result<ImageReport> + Sync,
{
    config.validate_parameters()?;

    let files = list_segmentation_files(&config.seed_seg_dir)?;
    info!("Extracting angles from {} seed segmentations", files.len());

    let start = Instant::now();
    let mut summary = if config.use_parallel {
        run_parallel(config, sink, &process, &files)?
    } else {
        run_sequential(config, sink, &process, &files)?
    };
    summary.elapsed = start.elapsed();

    info!(
        "Extracting angles for {} images took {} ({} results, {} errors)",
        summary.files,
        natural_duration(summary.elapsed),
        summary.results,
        summary.errors
    );

    Ok(summary)
}

fn run_sequential<S, F>(config: &Config, sink: &mut S, process: &F, files: &[String]) -> Result<BatchSummary>
where
    S: RecordSink + ?Sized,
    F: Fn(&str, &Config) -> Result<ImageReport>,
{
    let mut summary = BatchSummary::default();

    for (i, file_name) in files.iter().enumerate() {
        info!("Extracting angles: {}/{} {}", i + 1, files.len(), file_name);

        match process(file_name.as_str(), config) {
            Ok(report) => {
                sink.write_report(&report)?;
                summary.add(&report, false);
            }
            Err(e) => {
                error!("{}: {}", file_name, e);
                let report = ImageReport::file_failure(file_name, e.to_string());
                sink.write_report(&report)?;
                summary.add(&report, true);
                if config.abort_on_file_error {
                    return Err(e);
                }
            }
        }
    }

    Ok(summary)
}

fn run_parallel<S, F>(config: &Config, sink: &mut S, process: &F, files: &[String]) -> Result<BatchSummary>
where
    S: RecordSink + ?Sized,
    F: Fn(&str, &Config) -> Result<ImageReport> + Sync,
{
    let options = ExecutorOptions {
        workers: config.workers,
        chunk_size: config.chunk_size,
    };
    let total = files.len();

    let outcomes = run_chunked(
        |config: &Config, file_name: &String| process(file_name.as_str(), config),
        config,
        files,
        options,
        |done| info!("Extracting angles: {}/{} images done", done, total),
    )?;

    // only this thread writes to the sink
    let mut summary = BatchSummary::default();
    let mut first_failure: Option<RootAngleError> = None;

    for (file_name, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(report) => {
                sink.write_report(&report)?;
                summary.add(&report, false);
            }
            Err(e) => {
                error!("{}: {}", file_name, e);
                let report = ImageReport::file_failure(file_name, e.to_string());
                sink.write_report(&report)?;
                summary.add(&report, true);
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    match first_failure {
        Some(e) if config.abort_on_file_error => Err(e),
        _ => Ok(summary),
    }
}

/// Rough human-readable duration, e.g. "a moment", "14 seconds", "2 minutes"
pub fn natural_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();

    fn plural(n: u64, unit: &str) -> String {
        if n == 1 {
            format!("a {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    }

    match secs {
        0 => "a moment".to_string(),
        1..=59 => plural(secs, "second"),
        60..=3599 => plural(secs / 60, "minute"),
        3600..=86_399 => plural(secs / 3600, "hour"),
        _ => plural(secs / 86_400, "day"),
    }
}
