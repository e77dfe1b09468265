//! NIBRS Extract Library
//!
//! A Rust library for converting NIBRS fixed-width extract files into CSV
//! using the column layout and labels declared in their SAS setup files.
//!
//! This library provides tools for:
//! - Parsing SAS setup `INPUT` and `LABEL` statements into a column schema
//! - Slicing fixed-width records into CSV rows, tolerating short lines
//! - Writing `VARIABLE,LABEL` tables for downstream tooling
//! - Reading dataset manifests and converting every segment with
//!   per-segment failure isolation

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod models;
pub mod processor;
pub mod transcode;

// Re-export commonly used types
pub use config::{ConvertConfig, TranscodeOptions, UnknownLabelPolicy};
pub use error::{ConvertError, Result};
pub use layout::{LayoutParser, parse_layout};
pub use models::{FieldDefinition, Row, Schema};
pub use transcode::Transcoder;
