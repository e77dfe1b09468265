//! Configuration management.
//!
//! Provides the conversion settings shared by the dataset processor and
//! the command line, plus the options handed to the transcoder.

use serde::{Deserialize, Serialize};

/// What to do with a LABEL assignment naming a variable the INPUT statement never declared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownLabelPolicy {
    /// Drop the label and log a warning
    #[default]
    Ignore,
    /// Fail the layout parse
    Error,
}

/// Options consumed by the fixed-width transcoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    /// Write field names as the first CSV record
    pub include_header: bool,
    /// Strip surrounding whitespace from extracted values
    pub trim_values: bool,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            trim_values: false,
        }
    }
}

/// Main configuration for dataset and segment conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Write field names as the first CSV record
    pub include_header: bool,

    /// Strip surrounding whitespace from extracted values
    pub trim_values: bool,

    /// Handling of labels for undeclared variables
    pub label_policy: UnknownLabelPolicy,

    /// Gzip the CSV and label outputs
    pub compress: bool,

    /// Show per-segment progress bars
    pub show_progress: bool,

    /// Stop at the first failed segment instead of continuing with the rest
    pub fail_fast: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            include_header: true,
            trim_values: false,
            label_policy: UnknownLabelPolicy::Ignore,
            compress: false,
            show_progress: true,
            fail_fast: false,
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    pub fn with_trimming(mut self) -> Self {
        self.trim_values = true;
        self
    }

    pub fn with_label_policy(mut self, policy: UnknownLabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn with_compression(mut self) -> Self {
        self.compress = true;
        self
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Options for the transcoder derived from this configuration
    pub fn transcode_options(&self) -> TranscodeOptions {
        TranscodeOptions {
            include_header: self.include_header,
            trim_values: self.trim_values,
        }
    }
}
