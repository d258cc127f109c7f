//! Crawler module for catalog traversal
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching behind a swappable transport
//! - Retry with jittered exponential backoff
//! - Index, entity page and detail page parsing
//! - Batch scheduling and the per-entity detail gate
//! - Overall run coordination

mod coordinator;
mod details;
mod entity;
mod fetcher;
mod index;
mod retry;
mod scheduler;

pub use coordinator::{Coordinator, HarvestReport};
pub use details::{parse_details, FieldExtractor, LabelPatternExtractor};
pub use entity::{choose_entity_name, extract_entity, parse_entity, EntityPage, UNKNOWN_ENTITY};
pub use fetcher::{
    build_http_client, DocumentFetcher, Page, ReqwestTransport, Transport, TransportResponse,
};
pub use index::{extract_entities, resolve_index};
pub use retry::{
    retry, sample_jitter, RecordingSleeper, RetryExhausted, RetryPolicy, Retryable, Sleeper,
    TokioSleeper,
};
pub use scheduler::{partition_batches, Batch, BatchPacer, DetailGate};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest over HTTP
///
/// This is the main entry point for a run. It will:
/// 1. Build the shared HTTP client
/// 2. Resolve the entity index
/// 3. Process every batch of entities
/// 4. Return the gathered records with run statistics
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::load_config;
/// use catalog_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(config).await?;
/// println!("{} records", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<HarvestReport, HarvestError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
