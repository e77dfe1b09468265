//! Segment and dataset conversion.
//!
//! Orchestrates the complete extraction workflow: manifest reading,
//! layout parsing, fixed-width transcoding and CSV/label output, with
//! per-segment failure isolation so one bad segment does not stop the
//! rest of the dataset.

use crate::config::ConvertConfig;
use crate::constants::{
    CSV_EXTENSION, DEFAULT_OUTPUT_DIR, GZIP_EXTENSION, LABELS_SUFFIX, PROGRESS_CHARS,
    PROGRESS_TEMPLATE,
};
use crate::error::{ConvertError, Result};
use crate::layout::LayoutParser;
use crate::manifest::{Manifest, SegmentEntry};
use crate::models::{ProcessingStats, SegmentFailure, SegmentOutput};
use crate::transcode::Transcoder;

use colored::*;
use flate2::Compression;
use flate2::write::GzEncoder;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Output sink for one CSV file, optionally gzip-encoded
enum OutputFile {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    fn create(path: &Path, compress: bool) -> Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if compress {
            Self::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Self::Plain(file)
        })
    }

    fn finish(self) -> Result<()> {
        let mut inner = match self {
            Self::Plain(writer) => writer,
            Self::Gzip(encoder) => encoder.finish()?,
        };
        inner.flush()?;
        Ok(())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(writer) => writer.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(writer) => writer.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Output file names for a segment directory
pub fn output_paths(output_dir: &Path, directory: &str, compress: bool) -> (PathBuf, PathBuf) {
    let suffix = if compress {
        format!("{}.{}", CSV_EXTENSION, GZIP_EXTENSION)
    } else {
        CSV_EXTENSION.to_string()
    };
    (
        output_dir.join(format!("{}.{}", directory, suffix)),
        output_dir.join(format!("{}{}.{}", directory, LABELS_SUFFIX, suffix)),
    )
}

/// Convert one segment: parse its layout, then write the data CSV and the label table.
///
/// The layout is parsed and validated before any output file is created.
/// If writing fails part-way, both output files are removed.
pub fn convert_segment(
    layout_path: &Path,
    data_path: &Path,
    csv_path: &Path,
    labels_path: &Path,
    config: &ConvertConfig,
    progress: Option<&ProgressBar>,
) -> Result<SegmentOutput> {
    let schema = LayoutParser::new()
        .with_label_policy(config.label_policy)
        .parse_file(layout_path)?;
    let transcoder = Transcoder::new(schema, config.transcode_options())?;

    if !data_path.exists() {
        return Err(ConvertError::FileNotFound {
            path: data_path.to_path_buf(),
        });
    }
    let reader = BufReader::new(File::open(data_path)?);

    let result = write_outputs(&transcoder, reader, csv_path, labels_path, config, progress);
    if result.is_err() {
        for path in [csv_path, labels_path] {
            if path.exists() {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Could not remove partial output {}: {}", path.display(), e);
                }
            }
        }
    }
    let rows_written = result?;

    debug!(
        "Converted {} -> {} ({} rows)",
        data_path.display(),
        csv_path.display(),
        rows_written
    );

    Ok(SegmentOutput {
        rows_written,
        fields: transcoder.schema().len(),
        csv_path: csv_path.to_path_buf(),
        labels_path: labels_path.to_path_buf(),
    })
}

fn write_outputs<R: BufRead>(
    transcoder: &Transcoder,
    reader: R,
    csv_path: &Path,
    labels_path: &Path,
    config: &ConvertConfig,
    progress: Option<&ProgressBar>,
) -> Result<usize> {
    let mut labels = OutputFile::create(labels_path, config.compress)?;
    transcoder.write_labels(&mut labels)?;
    labels.finish()?;

    let mut output = OutputFile::create(csv_path, config.compress)?;
    let lines = reader.lines().inspect(|_| {
        if let Some(pb) = progress {
            pb.inc(1);
        }
    });
    let rows_written = transcoder.write_csv(lines, &mut output)?;
    output.finish()?;

    Ok(rows_written)
}

/// Converts every segment listed in a dataset's manifest
pub struct DatasetProcessor {
    dataset_path: PathBuf,
    output_path: PathBuf,
    config: ConvertConfig,
}

impl DatasetProcessor {
    /// Create a new dataset processor; output defaults to `<dataset>/csv`
    pub fn new(dataset_path: PathBuf, output_path: Option<PathBuf>) -> Result<Self> {
        if !dataset_path.is_dir() {
            return Err(ConvertError::DatasetNotFound { path: dataset_path });
        }

        let output_path = output_path.unwrap_or_else(|| dataset_path.join(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            dataset_path,
            output_path,
            config: ConvertConfig::default(),
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Main processing entry point
    pub fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let manifest = Manifest::load(&self.dataset_path)?;

        println!("{}", "Starting NIBRS extraction".bright_green().bold());
        println!(
            "  {} {}",
            "Dataset:".bright_cyan(),
            self.dataset_path.display()
        );
        if let Some(year) = manifest.year {
            println!("  {} {}", "Year:".bright_cyan(), year);
        }
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            self.output_path.display()
        );

        fs::create_dir_all(&self.output_path)?;

        let mut stats = ProcessingStats {
            output_path: self.output_path.clone(),
            ..ProcessingStats::default()
        };

        let total = manifest.segments.len();
        for (index, segment) in manifest.segments.iter().enumerate() {
            println!(
                "\n{} Extracting {}",
                format!("({}/{})", index + 1, total).bright_yellow(),
                segment.directory.bright_white().bold()
            );

            match self.process_segment(segment) {
                Ok(output) => {
                    if output.rows_written as u64 != segment.records {
                        warn!(
                            "Segment {} wrote {} rows but the manifest lists {} records",
                            segment.directory, output.rows_written, segment.records
                        );
                    }
                    stats.segments_processed += 1;
                    stats.total_rows += output.rows_written;
                }
                Err(e) => {
                    error!("Failed to extract segment {}: {:#}", segment.directory, e);
                    if self.config.fail_fast {
                        return Err(e);
                    }
                    stats.segments_failed += 1;
                    stats.failures.push(SegmentFailure {
                        directory: segment.directory.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        self.report_summary(&stats);

        Ok(stats)
    }

    fn process_segment(&self, segment: &SegmentEntry) -> Result<SegmentOutput> {
        let (csv_path, labels_path) =
            output_paths(&self.output_path, &segment.directory, self.config.compress);

        let pb = if self.config.show_progress {
            let pb = ProgressBar::new(segment.records);
            if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
                pb.set_style(style.progress_chars(PROGRESS_CHARS));
            }
            pb.set_message(format!("converting {}", segment.directory));
            pb
        } else {
            ProgressBar::hidden()
        };

        let result = convert_segment(
            &segment.setup_path(&self.dataset_path),
            &segment.data_path(&self.dataset_path),
            &csv_path,
            &labels_path,
            &self.config,
            Some(&pb),
        );

        match &result {
            Ok(output) => {
                pb.finish_with_message(format!("{} rows", output.rows_written));
                info!(
                    "Segment {}: {} fields, {} rows",
                    segment.directory, output.fields, output.rows_written
                );
            }
            Err(_) => pb.abandon_with_message("failed"),
        }

        result
    }

    fn report_summary(&self, stats: &ProcessingStats) {
        println!("\n{}", "Extraction Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {}",
            "Segments processed:".bright_cyan(),
            stats.segments_processed.to_string().bright_white()
        );
        if stats.segments_failed > 0 {
            println!(
                "  {} {}",
                "Segments failed:".bright_red(),
                stats.segments_failed.to_string().bright_red().bold()
            );
            for failure in &stats.failures {
                println!("    {} {}", failure.directory.bright_red(), failure.reason);
            }
        }
        println!(
            "  {} {}",
            "Total rows:".bright_cyan(),
            stats.total_rows.to_string().bright_white().bold()
        );
    }
}

#[cfg(test)]
mod tests;
