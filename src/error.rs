//! Error handling for layout parsing and fixed-width conversion.
//!
//! Distinguishes malformed layout metadata (fatal for a segment) from
//! I/O failures and dataset-level problems.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read data line {line}: {source}")]
    DataRead {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Layout parse error at line {line}: {message}")]
    SchemaParse { line: usize, message: String },

    #[error("Label at line {line} references undeclared field '{name}'")]
    UnknownLabel { name: String, line: usize },

    #[error("Invalid schema: field '{field}' has offsets {start}-{end} ({reason})")]
    InvalidSchema {
        field: String,
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Dataset not found at path: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("Invalid manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ConvertError {
    pub(crate) fn schema_parse(line: usize, message: impl Into<String>) -> Self {
        Self::SchemaParse {
            line,
            message: message.into(),
        }
    }

    /// True for errors caused by the layout file rather than the data or filesystem
    pub fn is_layout_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaParse { .. } | Self::UnknownLabel { .. } | Self::InvalidSchema { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
