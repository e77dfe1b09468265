//! Core data structures shared by the layout parser and the transcoder.
//!
//! Defines field definitions, the ordered schema, extracted rows and
//! the processing statistics reported by the dataset processor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One declared column of a fixed-width record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    /// 1-based, inclusive
    pub start: usize,
    /// 1-based, inclusive
    pub end: usize,
    pub label: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of characters covered by this field
    pub fn width(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    /// Label text, or an empty string when none was declared
    pub fn label_or_empty(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// Ordered field definitions for one segment.
///
/// Field order is declaration order and defines the output column order.
/// Names are unique; `from_fields` is the only constructor and enforces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    fields: Vec<FieldDefinition>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema, returning the first duplicated name on conflict
    pub fn from_fields(fields: Vec<FieldDefinition>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), position).is_some() {
                return Err(field.name.clone());
            }
        }
        Ok(Self { fields, index })
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Logical record length: the largest declared end offset
    pub fn record_length(&self) -> usize {
        self.fields.iter().map(|f| f.end).max().unwrap_or(0)
    }
}

/// Values sliced from one fixed-width line, in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number in the data file
    pub line_number: usize,
    pub values: Vec<String>,
}

impl Row {
    pub fn get(&self, column: usize) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// A segment that could not be converted
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    pub directory: String,
    pub reason: String,
}

/// Outcome of converting a single segment
#[derive(Debug, Clone, Default)]
pub struct SegmentOutput {
    pub rows_written: usize,
    pub fields: usize,
    pub csv_path: PathBuf,
    pub labels_path: PathBuf,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub segments_processed: usize,
    pub segments_failed: usize,
    pub total_rows: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
    pub failures: Vec<SegmentFailure>,
}
