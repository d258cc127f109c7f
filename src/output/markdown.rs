//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a harvest run:
//! overall counts, one row per batch, and the entities that did not yield
//! every sub-item.

use crate::output::stats::{EntityStatus, RunStatistics};
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from run statistics
///
/// # Arguments
///
/// * `stats` - The statistics of a finished run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(stats: &RunStatistics, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!(path = %output_path.display(), "Wrote run summary");
    Ok(())
}

/// Formats run statistics as markdown
pub fn format_markdown_summary(stats: &RunStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Catalog Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", stats.started_at.to_rfc3339()));
    if let Some(finished) = stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = stats.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    if let Some(hash) = &stats.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Entities in Index**: {}\n", stats.entities_total));
    md.push_str(&format!("- **Batches**: {}\n", stats.batches.len()));
    md.push_str(&format!(
        "- **Sub-items Discovered**: {}\n",
        stats.sub_items_discovered()
    ));
    md.push_str(&format!("- **Records**: {}\n", stats.total_records()));
    md.push_str(&format!(
        "- **Sub-items Dropped**: {}\n",
        stats.sub_items_failed()
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    md.push_str("## Entity Status Breakdown\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    for status in [
        EntityStatus::Completed,
        EntityStatus::Absent,
        EntityStatus::Failed,
    ] {
        md.push_str(&format!(
            "| {} | {} |\n",
            status,
            stats.entities_with_status(status)
        ));
    }
    md.push('\n');

    if !stats.batches.is_empty() {
        md.push_str("## Batches\n\n");
        md.push_str("| Batch | Size | Completed | Absent | Failed | Records | Pause |\n");
        md.push_str("|-------|------|-----------|--------|--------|---------|-------|\n");

        for batch in &stats.batches {
            let pause = batch
                .pause
                .map(|p| format!("{:.1}s", p.as_secs_f64()))
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                batch.index,
                batch.size,
                batch.entities_completed,
                batch.entities_absent,
                batch.entities_failed,
                batch.records,
                pause
            ));
        }
        md.push('\n');
    }

    let incomplete: Vec<_> = stats
        .entities
        .iter()
        .filter(|e| e.status != EntityStatus::Completed || e.failed > 0)
        .collect();

    if !incomplete.is_empty() {
        md.push_str("## Incomplete Entities\n\n");
        md.push_str("| Entity | Status | Processed | Discovered |\n");
        md.push_str("|--------|--------|-----------|------------|\n");

        for entity in incomplete {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                entity.name, entity.status, entity.processed, entity.discovered
            ));
        }
        md.push('\n');
    }

    md
}
