//! Dataset manifest parsing.
//!
//! A NIBRS extract ships with a `*manifest.txt` listing its segments. Each
//! segment is a directory holding one fixed-width data file and the SAS
//! setup file that describes its columns. The manifest also states the
//! year the data covers.

use crate::constants::{
    MANIFEST_DATA_FRAGMENT, MANIFEST_END_MARKER, MANIFEST_PATTERN, MANIFEST_SEGMENTS_MARKER,
    MANIFEST_SETUP_FRAGMENT,
};
use crate::error::{ConvertError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]{4}").expect("year pattern is valid"));

/// One segment described by the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub directory: String,
    pub data_file: String,
    pub setup_file: String,
    /// Record count stated by the manifest
    pub records: u64,
}

impl SegmentEntry {
    pub fn data_path(&self, dataset_dir: &Path) -> PathBuf {
        dataset_dir.join(&self.directory).join(&self.data_file)
    }

    pub fn setup_path(&self, dataset_dir: &Path) -> PathBuf {
        dataset_dir.join(&self.directory).join(&self.setup_file)
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub year: Option<u16>,
    pub segments: Vec<SegmentEntry>,
}

#[derive(Default)]
struct SegmentBuilder {
    directory: String,
    data_file: Option<String>,
    setup_file: Option<String>,
    records: Option<u64>,
}

impl SegmentBuilder {
    fn new(directory: &str) -> Self {
        Self {
            directory: directory.to_string(),
            ..Self::default()
        }
    }

    fn parse_line(&mut self, line: &str, path: &Path) -> Result<()> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(&file_name) = words.first() else {
            return Ok(());
        };

        if line.contains(MANIFEST_DATA_FRAGMENT) {
            let count = words.get(2).ok_or_else(|| ConvertError::ManifestParse {
                path: path.to_path_buf(),
                reason: format!("no record count for data file '{}'", file_name),
            })?;
            let records = count
                .replace(',', "")
                .parse::<u64>()
                .map_err(|_| ConvertError::ManifestParse {
                    path: path.to_path_buf(),
                    reason: format!("invalid record count '{}' for '{}'", count, file_name),
                })?;
            self.data_file = Some(file_name.to_string());
            self.records = Some(records);
        }

        if line.contains(MANIFEST_SETUP_FRAGMENT) {
            self.setup_file = Some(file_name.to_string());
        }

        Ok(())
    }

    fn build(self, path: &Path) -> Result<SegmentEntry> {
        let missing = |what: &str| ConvertError::ManifestParse {
            path: path.to_path_buf(),
            reason: format!("segment '{}' lists no {}", self.directory, what),
        };

        let data_file = self.data_file.clone().ok_or_else(|| missing("data file"))?;
        let setup_file = self.setup_file.clone().ok_or_else(|| missing("SAS setup file"))?;
        let records = self.records.unwrap_or_default();

        Ok(SegmentEntry {
            directory: self.directory,
            data_file,
            setup_file,
            records,
        })
    }
}

impl Manifest {
    /// Locate the manifest inside a dataset directory
    pub fn find(dataset_dir: &Path) -> Result<PathBuf> {
        let pattern = dataset_dir.join(MANIFEST_PATTERN);
        let pattern_str = pattern.to_string_lossy();

        debug!("Searching for manifest with pattern: {}", pattern_str);

        let mut matches = glob::glob(&pattern_str)
            .map_err(|e| ConvertError::Configuration {
                message: format!("Invalid manifest pattern '{}': {}", pattern_str, e),
            })?
            .filter_map(|entry| entry.ok());

        matches.next().ok_or_else(|| ConvertError::DatasetNotFound {
            path: dataset_dir.to_path_buf(),
        })
    }

    /// Find and parse the manifest of a dataset directory
    pub fn load(dataset_dir: &Path) -> Result<Self> {
        let path = Self::find(dataset_dir)?;
        let text = fs::read_to_string(&path)?;
        Self::parse(&text, &path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let year = text
            .lines()
            .skip(1)
            .find_map(|line| YEAR_PATTERN.find(line))
            .and_then(|m| m.as_str().parse().ok());

        let mut lines = text.lines();
        for line in lines.by_ref() {
            if line.starts_with(MANIFEST_SEGMENTS_MARKER) {
                break;
            }
        }

        let mut segments = Vec::new();
        let mut current: Option<SegmentBuilder> = None;

        for line in lines {
            let Some(first) = line.chars().next() else {
                continue;
            };

            if first.is_alphabetic() {
                if line.starts_with(MANIFEST_END_MARKER) {
                    break;
                }
                if let Some(segment) = current.take() {
                    segments.push(segment.build(path)?);
                }
                let directory = line.split_whitespace().next().unwrap_or_default();
                current = Some(SegmentBuilder::new(directory));
            } else if let Some(segment) = current.as_mut() {
                segment.parse_line(line, path)?;
            }
        }

        if let Some(segment) = current.take() {
            segments.push(segment.build(path)?);
        }

        if segments.is_empty() {
            return Err(ConvertError::ManifestParse {
                path: path.to_path_buf(),
                reason: "no segments listed".to_string(),
            });
        }

        debug!(
            "Manifest {} lists {} segments (year {:?})",
            path.display(),
            segments.len(),
            year
        );

        Ok(Self {
            path: path.to_path_buf(),
            year,
            segments,
        })
    }
}
