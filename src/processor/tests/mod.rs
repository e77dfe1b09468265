//! Scenario tests for the processor module
//!
//! Builds small NIBRS-style datasets (manifest, SAS setup files and
//! fixed-width data) in temporary directories and runs the full pipeline.


use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const WORKED_SETUP: &str = r#"
/* SAS setup for the worked example */
DATA;
INFILE "data-filename" LRECL=8;
INPUT
   COLUMN001 $ 1        COLUMN002 2     COLUMN003 3-5       COLUMN004 6-8;
LABEL
   COLUMN001 = "FIRST COLUMN"
   COLUMN002 = "SECOND COLUMN"
   COLUMN003 = "THIRD COLUMN"
   COLUMN004 = "FOURTH COLUMN";
RUN;
"#;

pub const WORKED_DATA: &str = "1ab c111\n2de,f222\n3g\n";

/// Segment directory, setup text and data text
pub type SegmentSpec<'a> = (&'a str, &'a str, &'a str);

/// Write a manifest plus one directory per segment, returning the dataset path
pub fn create_dataset(temp_dir: &TempDir, segments: &[SegmentSpec<'_>]) -> PathBuf {
    let dataset_path = temp_dir.path().join("99999-nibrs-2016");
    fs::create_dir_all(&dataset_path).unwrap();

    let mut manifest = String::from(
        "ICPSR 99999\nNational Incident-Based Reporting System, 2016: Extract Files\n\nStudy-level files\n",
    );

    for (directory, setup, data) in segments {
        let segment_path = dataset_path.join(directory);
        fs::create_dir_all(&segment_path).unwrap();

        let data_file = format!("{}-Data.txt", directory);
        let setup_file = format!("{}-Setup.sas", directory);
        fs::write(segment_path.join(&data_file), data).unwrap();
        fs::write(segment_path.join(&setup_file), setup).unwrap();

        manifest.push_str(&format!(
            "{}\n  {}  ASCII  {} records\n  {}\n",
            directory,
            data_file,
            data.lines().count(),
            setup_file
        ));
    }
    manifest.push_str("\nVersion History\n");

    fs::write(dataset_path.join("99999-manifest.txt"), manifest).unwrap();
    dataset_path
}

pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}
