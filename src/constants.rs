//! Application constants for the NIBRS extractor
//!
//! Keywords of the SAS setup dialect, manifest markers, output naming
//! and display defaults used throughout the crate.

// =============================================================================
// SAS Setup Keywords
// =============================================================================

/// Statement keyword introducing the column declarations
pub const INPUT_KEYWORD: &str = "INPUT";

/// Statement keyword introducing the variable labels
pub const LABEL_KEYWORD: &str = "LABEL";

/// Character-type marker that may precede a position
pub const CHARACTER_MARKER: char = '$';

// =============================================================================
// Output Layout
// =============================================================================

/// Header row of the label table
pub const LABEL_HEADER: [&str; 2] = ["VARIABLE", "LABEL"];

/// Extension of converted data files
pub const CSV_EXTENSION: &str = "csv";

/// Suffix appended to the segment directory for the label table
pub const LABELS_SUFFIX: &str = "-labels";

/// Extension appended when gzip output is enabled
pub const GZIP_EXTENSION: &str = "gz";

/// Default output directory name inside the dataset when none is given
pub const DEFAULT_OUTPUT_DIR: &str = "csv";

// =============================================================================
// Dataset Manifest
// =============================================================================

/// Glob matching the manifest file inside a dataset directory
pub const MANIFEST_PATTERN: &str = "*manifest.txt";

/// Line prefix after which segment descriptions begin
pub const MANIFEST_SEGMENTS_MARKER: &str = "Study-level";

/// Line prefix that ends the segment descriptions
pub const MANIFEST_END_MARKER: &str = "Version";

/// File name fragment identifying a segment's data file
pub const MANIFEST_DATA_FRAGMENT: &str = ".txt";

/// File name fragment identifying a segment's SAS setup file
pub const MANIFEST_SETUP_FRAGMENT: &str = ".sas";

// =============================================================================
// Display
// =============================================================================

/// Progress bar layout for per-segment conversion
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

/// Progress bar characters
pub const PROGRESS_CHARS: &str = "#>-";
