//! Batch scheduling and concurrency limits
//!
//! This module handles:
//! - Partitioning the sorted entity list into fixed-size batches
//! - The randomized pause between consecutive batches
//! - The per-entity gate bounding simultaneous detail fetches

use crate::config::CrawlerConfig;
use crate::model::EntityReference;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// An ordered slice of the entity list processed concurrently
#[derive(Debug, Clone)]
pub struct Batch {
    /// 1-based position of this batch in the run
    pub index: usize,

    /// Entities of this batch, in index order
    pub entities: Vec<EntityReference>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Splits `entities` into batches of at most `batch_size`, preserving order
///
/// A `batch_size` of zero is treated as one.
pub fn partition_batches(entities: Vec<EntityReference>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(entities.len().div_ceil(batch_size));
    let mut entities = entities.into_iter().peekable();

    while entities.peek().is_some() {
        let chunk: Vec<_> = entities.by_ref().take(batch_size).collect();
        batches.push(Batch {
            index: batches.len() + 1,
            entities: chunk,
        });
    }

    batches
}

/// Draws the pause taken between consecutive batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPacer {
    min: Duration,
    max: Duration,
}

impl BatchPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.batch_pause_min_ms),
            Duration::from_millis(config.batch_pause_max_ms),
        )
    }

    /// A pause drawn uniformly from `[min, max]`
    pub fn pause_duration(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Counting gate bounding the in-flight detail fetches of one entity
#[derive(Debug, Clone)]
pub struct DetailGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl DetailGate {
    /// Creates a gate admitting `capacity` holders at once (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a slot; the slot is released when the permit is dropped
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
