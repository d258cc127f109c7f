//! Output handler traits and types
//!
//! This module defines the trait interface for record sinks and the errors
//! they report.

use crate::model::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
///
/// A handler receives the final record sequence of a run once, after every
/// batch has completed.
pub trait OutputHandler {
    /// Writes `records` in column order
    ///
    /// # Returns
    ///
    /// The number of rows written, headers excluded
    fn write_records(&mut self, records: &[Record]) -> OutputResult<usize>;
}
