use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler pacing and resilience configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of entities processed concurrently in one batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Timeout applied to every request, including the body read (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Attempts made by the retrier before giving up
    #[serde(rename = "retry-count")]
    pub retry_count: u32,

    /// Base delay of the exponential backoff (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Maximum simultaneous sub-item detail fetches per entity
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: usize,

    /// Lower bound of the randomized pause between batches (milliseconds)
    #[serde(rename = "batch-pause-min-ms")]
    pub batch_pause_min_ms: u64,

    /// Upper bound of the randomized pause between batches (milliseconds)
    #[serde(rename = "batch-pause-max-ms")]
    pub batch_pause_max_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            request_timeout_ms: 15_000,
            retry_count: 3,
            initial_delay_ms: 1_000,
            max_concurrent_details: 5,
            batch_pause_min_ms: 3_000,
            batch_pause_max_ms: 5_000,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Site layout configuration: where the catalog lives and how its pages are read
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root page listing every entity
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path, relative to the base URL, under which entity pages live
    /// when an index option carries no explicit value
    #[serde(rename = "entity-path")]
    pub entity_path: String,

    /// A selection control qualifies as the entity index only when it
    /// holds more options than this
    #[serde(rename = "min-index-options")]
    pub min_index_options: usize,

    /// Lowercase substrings marking an index option as a placeholder
    #[serde(rename = "placeholder-markers")]
    pub placeholder_markers: Vec<String>,

    /// Lowercase prefix of the site's page titles; options and headings
    /// starting with it are placeholders rather than names
    #[serde(rename = "title-prefix")]
    pub title_prefix: String,

    /// Text marker identifying sub-item links on an entity page
    #[serde(rename = "sub-item-marker")]
    pub sub_item_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cb.imsc.res.in/imppat/".to_string(),
            entity_path: "imppat/phytochemical/".to_string(),
            min_index_options: 10,
            placeholder_markers: vec!["choose".to_string(), "dropdown".to_string()],
            title_prefix: "imppat |".to_string(),
            sub_item_marker: "IMPHY".to_string(),
        }
    }
}

impl SiteConfig {
    /// Returns true if `text` carries the site's title prefix
    pub fn has_title_prefix(&self, text: &str) -> bool {
        text.to_lowercase().starts_with(&self.title_prefix.to_lowercase())
    }

    /// Returns true if an index option label is a placeholder, not an entity
    pub fn is_placeholder(&self, label: &str) -> bool {
        let lower = label.to_lowercase();
        self.placeholder_markers
            .iter()
            .any(|marker| lower.contains(&marker.to_lowercase()))
            || self.has_title_prefix(label)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Product name sent in the User-Agent header
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Product version sent in the User-Agent header
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Optional URL describing the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Mozilla".to_string(),
            crawler_version: "5.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the CSV dataset
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Path of the markdown run summary, if one should be written
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "imppat_all_plants.csv".to_string(),
            summary_path: None,
        }
    }
}
