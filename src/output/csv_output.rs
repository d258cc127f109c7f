//! CSV dataset writer
//!
//! Writes one row per record under the fixed column headers.

use crate::model::{Record, COLUMN_HEADERS};
use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use std::path::{Path, PathBuf};

/// Writes records to a CSV file, replacing any previous file at the path
#[derive(Debug, Clone)]
pub struct CsvOutputHandler {
    path: PathBuf,
}

impl CsvOutputHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for CsvOutputHandler {
    fn write_records(&mut self, records: &[Record]) -> OutputResult<usize> {
        let mut writer = csv::Writer::from_path(&self.path)?;

        writer.write_record(COLUMN_HEADERS)?;
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer
            .flush()
            .map_err(|e| OutputError::Write(format!("{}: {}", self.path.display(), e)))?;

        Ok(records.len())
    }
}

/// Writes the dataset of a run
///
/// # Returns
///
/// * `Ok(Some(path))` - The file was written
/// * `Ok(None)` - There was nothing to write; no file is created
/// * `Err(OutputError)` - Writing failed
pub fn write_csv(records: &[Record], path: &Path) -> OutputResult<Option<PathBuf>> {
    if records.is_empty() {
        tracing::info!(path = %path.display(), "No records were processed, skipping CSV output");
        return Ok(None);
    }

    let mut handler = CsvOutputHandler::new(path);
    let rows = handler.write_records(records)?;
    tracing::info!(path = %path.display(), rows, "Wrote CSV dataset");

    Ok(Some(handler.path().to_path_buf()))
}
