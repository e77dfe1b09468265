//! Command-line interface components.

use crate::config::{ConvertConfig, UnknownLabelPolicy};
use crate::constants::{CSV_EXTENSION, LABELS_SUFFIX};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "nibrs_extract")]
#[command(about = "Convert NIBRS fixed-width extract files to CSV using their SAS setup files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract every segment listed in a dataset's manifest
    Extract(ExtractArgs),
    /// Convert a single data file with its SAS setup file
    Segment(SegmentArgs),
    /// Print the column layout parsed from a SAS setup file
    Schema(SchemaArgs),
}

/// Output options shared by `extract` and `segment`
#[derive(ClapArgs, Debug, Clone)]
pub struct OutputOptions {
    /// Omit the header row of field names from data CSVs
    #[arg(long)]
    pub no_header: bool,

    /// Strip surrounding whitespace from extracted values
    #[arg(long)]
    pub trim: bool,

    /// Fail when a LABEL names a variable missing from INPUT
    #[arg(long)]
    pub strict_labels: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ExtractArgs {
    /// Path to the extracted dataset directory containing the manifest
    #[arg(value_name = "DATASET_PATH")]
    pub dataset_path: PathBuf,

    /// Output directory for CSV files (defaults to DATASET_PATH/csv)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Write gzip-compressed CSV files
    #[arg(long)]
    pub gzip: bool,

    /// Stop at the first segment that fails
    #[arg(long)]
    pub fail_fast: bool,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(ClapArgs, Debug)]
pub struct SegmentArgs {
    /// SAS setup file describing the columns
    #[arg(short, long, value_name = "SETUP_FILE")]
    pub layout: PathBuf,

    /// Fixed-width data file
    #[arg(short, long, value_name = "DATA_FILE")]
    pub data: PathBuf,

    /// Output CSV path (defaults to the data file with a .csv extension)
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Output path of the label table (defaults to <output>-labels.csv)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(ClapArgs, Debug)]
pub struct SchemaArgs {
    /// SAS setup file to parse
    #[arg(value_name = "SETUP_FILE")]
    pub layout: PathBuf,

    /// Print the schema as JSON
    #[arg(long)]
    pub json: bool,

    /// Fail when a LABEL names a variable missing from INPUT
    #[arg(long)]
    pub strict_labels: bool,
}

impl Args {
    /// Log level derived from -v/-q
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

impl OutputOptions {
    /// Apply flag overrides on top of the default configuration
    pub fn to_config(&self, quiet: bool) -> ConvertConfig {
        ConvertConfig {
            include_header: !self.no_header,
            trim_values: self.trim,
            show_progress: !(self.no_progress || quiet),
            label_policy: label_policy(self.strict_labels),
            ..ConvertConfig::default()
        }
    }
}

impl SegmentArgs {
    /// CSV and label output paths, defaulting next to the data file
    pub fn get_output_paths(&self) -> (PathBuf, PathBuf) {
        let csv_path = self
            .output_path
            .clone()
            .unwrap_or_else(|| self.data.with_extension(CSV_EXTENSION));
        let labels_path = self
            .labels
            .clone()
            .unwrap_or_else(|| labels_path_for(&csv_path));
        (csv_path, labels_path)
    }
}

pub fn label_policy(strict: bool) -> UnknownLabelPolicy {
    if strict {
        UnknownLabelPolicy::Error
    } else {
        UnknownLabelPolicy::Ignore
    }
}

fn labels_path_for(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    csv_path.with_file_name(format!("{}{}.{}", stem, LABELS_SUFFIX, CSV_EXTENSION))
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nibrs_extract={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_flags() {
        let args = Args::parse_from([
            "nibrs_extract",
            "extract",
            "/data/nibrs-2016",
            "--gzip",
            "--no-header",
            "--strict-labels",
            "-vv",
        ]);
        assert_eq!(args.get_log_level(), "debug");

        let Commands::Extract(extract) = &args.command else {
            panic!("Expected extract command");
        };
        assert!(extract.gzip);
        let config = extract.output.to_config(args.quiet);
        assert!(!config.include_header);
        assert!(config.show_progress);
        assert_eq!(config.label_policy, UnknownLabelPolicy::Error);
    }

    #[test]
    fn test_quiet_hides_progress() {
        let args = Args::parse_from(["nibrs_extract", "-q", "extract", "/data"]);
        assert_eq!(args.get_log_level(), "error");
        let Commands::Extract(extract) = &args.command else {
            panic!("Expected extract command");
        };
        assert!(!extract.output.to_config(args.quiet).show_progress);
    }

    #[test]
    fn test_segment_default_paths() {
        let args = Args::parse_from([
            "nibrs_extract",
            "segment",
            "--layout",
            "/data/DS0001/setup.sas",
            "--data",
            "/data/DS0001/records.txt",
        ]);
        let Commands::Segment(segment) = &args.command else {
            panic!("Expected segment command");
        };
        assert_eq!(
            segment.get_output_paths(),
            (
                PathBuf::from("/data/DS0001/records.csv"),
                PathBuf::from("/data/DS0001/records-labels.csv")
            )
        );
    }
}
