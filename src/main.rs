//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the catalog harvester.

use anyhow::Context;
use clap::Parser;
use catalog_harvest::config::{load_config_with_hash, validate, Config};
use catalog_harvest::crawler::run_harvest;
use catalog_harvest::output::{generate_markdown_summary, print_statistics, write_csv};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resilient crawler for hierarchical catalog sites
///
/// Walks the index page, every entity page and every sub-item page of a
/// catalog, and writes the extracted fields as a CSV dataset.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
#[command(about = "A resilient crawler for hierarchical catalog sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; built-in defaults are used when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write the CSV dataset here instead of the configured path
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write a markdown run summary here
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Validate and print the effective configuration without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!(hash = %hash, "Configuration loaded");
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            (Config::default(), None)
        }
    };

    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }
    if let Some(summary) = &cli.summary {
        config.output.summary_path = Some(summary.display().to_string());
    }
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            _ => EnvFilter::new("catalog_harvest=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!("  Retry count: {}", config.crawler.retry_count);
    println!("  Initial delay: {}ms", config.crawler.initial_delay_ms);
    println!(
        "  Max concurrent details: {}",
        config.crawler.max_concurrent_details
    );
    println!(
        "  Batch pause: {}-{}ms",
        config.crawler.batch_pause_min_ms, config.crawler.batch_pause_max_ms
    );

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Entity path: {}", config.site.entity_path);
    println!("  Min index options: {}", config.site.min_index_options);
    println!("  Placeholder markers: {:?}", config.site.placeholder_markers);
    println!("  Title prefix: {}", config.site.title_prefix);
    println!("  Sub-item marker: {}", config.site.sub_item_marker);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    match &config.output.summary_path {
        Some(path) => println!("  Summary: {}", path),
        None => println!("  Summary: (none)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: Option<String>) -> anyhow::Result<()> {
    let csv_path = PathBuf::from(&config.output.csv_path);
    let summary_path = config.output.summary_path.clone().map(PathBuf::from);

    let mut report = match run_harvest(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Harvest failed");
            return Err(e).context("Harvest failed");
        }
    };
    report.statistics.config_hash = config_hash;

    match write_csv(&report.records, &csv_path)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?
    {
        Some(path) => println!(
            "✓ {} records written to {}",
            report.records.len(),
            path.display()
        ),
        None => println!("No records were processed."),
    }

    if let Some(path) = summary_path.as_deref() {
        write_summary(&report.statistics, path)?;
    }

    println!();
    print_statistics(&report.statistics);

    Ok(())
}

fn write_summary(stats: &catalog_harvest::output::RunStatistics, path: &Path) -> anyhow::Result<()> {
    generate_markdown_summary(stats, path)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    println!("✓ Summary written to {}", path.display());
    Ok(())
}
