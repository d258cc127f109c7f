//! Run statistics
//!
//! Per-entity and per-batch counts gathered while the coordinator runs, and
//! a console report of them.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// How processing of one entity ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityStatus {
    /// The entity page was parsed and its sub-items were attempted
    Completed,

    /// The entity page does not exist; zero work
    Absent,

    /// The entity page stayed unreachable after every retry, or its task aborted
    Failed,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Absent => "absent",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome counts of one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    /// Name the entity's records are filed under
    pub name: String,

    /// Name shown in the index
    pub display_name: String,

    pub status: EntityStatus,

    /// Sub-item links found on the entity page
    pub discovered: usize,

    /// Sub-items that produced a record
    pub processed: usize,

    /// Sub-items dropped after retry exhaustion
    pub failed: usize,
}

impl EntitySummary {
    pub fn new(display_name: &str, status: EntityStatus) -> Self {
        Self {
            name: display_name.to_string(),
            display_name: display_name.to_string(),
            status,
            discovered: 0,
            processed: 0,
            failed: 0,
        }
    }
}

/// Outcome counts of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// 1-based batch index
    pub index: usize,

    /// Entities in the batch
    pub size: usize,

    pub entities_completed: usize,
    pub entities_absent: usize,
    pub entities_failed: usize,

    /// Records contributed by this batch
    pub records: usize,

    /// Pause taken after this batch, if any
    pub pause: Option<Duration>,
}

impl BatchStats {
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size,
            ..Self::default()
        }
    }

    /// Counts one finished entity of this batch
    pub fn record_entity(&mut self, summary: &EntitySummary) {
        match summary.status {
            EntityStatus::Completed => self.entities_completed += 1,
            EntityStatus::Absent => self.entities_absent += 1,
            EntityStatus::Failed => self.entities_failed += 1,
        }
        self.records += summary.processed;
    }
}

/// Statistics of a whole run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// SHA-256 of the configuration file, when one was loaded
    pub config_hash: Option<String>,

    /// Entities found in the index
    pub entities_total: usize,

    pub batches: Vec<BatchStats>,

    /// One summary per entity, in completion order
    pub entities: Vec<EntitySummary>,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            config_hash: None,
            entities_total: 0,
            batches: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    pub fn total_records(&self) -> usize {
        self.entities.iter().map(|e| e.processed).sum()
    }

    pub fn sub_items_discovered(&self) -> usize {
        self.entities.iter().map(|e| e.discovered).sum()
    }

    pub fn sub_items_failed(&self) -> usize {
        self.entities.iter().map(|e| e.failed).sum()
    }

    pub fn entities_with_status(&self, status: EntityStatus) -> usize {
        self.entities.iter().filter(|e| e.status == status).count()
    }

    /// Pauses taken between batches
    pub fn pauses(&self) -> Vec<Duration> {
        self.batches.iter().filter_map(|b| b.pause).collect()
    }

    /// Share of discovered sub-items that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        let discovered = self.sub_items_discovered();
        if discovered == 0 {
            return 0.0;
        }
        (self.total_records() as f64 / discovered as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Entities in index: {}", stats.entities_total);
    println!("  Batches processed: {}", stats.batches.len());
    println!("  Sub-items discovered: {}", stats.sub_items_discovered());
    println!("  Records gathered: {}", stats.total_records());
    println!("  Sub-items dropped: {}", stats.sub_items_failed());
    if let Some(seconds) = stats.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    println!("Entities by Status:");
    for status in [
        EntityStatus::Completed,
        EntityStatus::Absent,
        EntityStatus::Failed,
    ] {
        println!("  {}: {}", status, stats.entities_with_status(status));
    }
    println!();

    let incomplete: Vec<_> = stats
        .entities
        .iter()
        .filter(|e| e.status != EntityStatus::Completed || e.failed > 0)
        .collect();

    if !incomplete.is_empty() {
        println!("Incomplete Entities ({}):", incomplete.len());
        for entity in incomplete {
            println!(
                "  - {} [{}]: {}/{} sub-items",
                entity.name, entity.status, entity.processed, entity.discovered
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} sub-items successfully processed)",
        stats.success_rate(),
        stats.total_records(),
        stats.sub_items_discovered()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, status: EntityStatus, discovered: usize, processed: usize) -> EntitySummary {
        EntitySummary {
            discovered,
            processed,
            failed: discovered - processed,
            ..EntitySummary::new(name, status)
        }
    }

    #[test]
    fn test_batch_stats_counts() {
        let mut batch = BatchStats::new(1, 3);
        batch.record_entity(&summary("A", EntityStatus::Completed, 5, 3));
        batch.record_entity(&summary("B", EntityStatus::Completed, 2, 2));
        batch.record_entity(&EntitySummary::new("C", EntityStatus::Failed));

        assert_eq!(batch.entities_completed, 2);
        assert_eq!(batch.entities_failed, 1);
        assert_eq!(batch.entities_absent, 0);
        assert_eq!(batch.records, 5);
    }

    #[test]
    fn test_run_totals() {
        let mut stats = RunStatistics::new();
        stats.entities.push(summary("A", EntityStatus::Completed, 5, 3));
        stats.entities.push(summary("B", EntityStatus::Completed, 3, 3));
        stats.entities.push(EntitySummary::new("C", EntityStatus::Absent));

        assert_eq!(stats.total_records(), 6);
        assert_eq!(stats.sub_items_discovered(), 8);
        assert_eq!(stats.sub_items_failed(), 2);
        assert_eq!(stats.entities_with_status(EntityStatus::Absent), 1);
        assert!((stats.success_rate() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_sub_items() {
        assert_eq!(RunStatistics::new().success_rate(), 0.0);
    }

    #[test]
    fn test_duration_after_finish() {
        let mut stats = RunStatistics::new();
        assert!(stats.duration_seconds().is_none());
        stats.finish();
        assert!(stats.duration_seconds().unwrap() >= 0);
    }
}
