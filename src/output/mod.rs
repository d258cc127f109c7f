//! Output module for datasets, run summaries and statistics
//!
//! This module handles:
//! - Writing the gathered records as a CSV dataset
//! - Generating a markdown summary of a run
//! - Recording and printing run statistics

mod csv_output;
mod markdown;
pub mod stats;
mod traits;

pub use csv_output::{write_csv, CsvOutputHandler};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, BatchStats, EntityStatus, EntitySummary, RunStatistics};
pub use traits::{OutputError, OutputHandler, OutputResult};
