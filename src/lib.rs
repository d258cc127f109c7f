//! Catalog-Harvest: a resilient crawler for hierarchical catalog sites
//!
//! This crate walks a three-level catalog (index page → entity pages →
//! sub-item pages), extracts a fixed set of fields from every sub-item and
//! emits them as flat records. Network calls are retried with jittered
//! exponential backoff, traversal is batched and concurrency-bounded, and a
//! broken page only ever costs the records that live beneath it.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Index unavailable: {reason}")]
    IndexUnavailable { reason: String },

    #[error(transparent)]
    RetryExhausted(#[from] crawler::RetryExhausted<FetchError>),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Detail gate closed: {0}")]
    GateClosed(#[from] tokio::sync::AcquireError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },
}

/// Errors produced by a single document fetch
///
/// `NotFound` is terminal: the retrier turns it into an absent result instead
/// of retrying. Every other variant is a retryable network error.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("Request timeout after {timeout_ms}ms for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// The URL the failed request was issued for
    pub fn url(&self) -> &str {
        match self {
            Self::NotFound { url }
            | Self::Timeout { url, .. }
            | Self::Status { url, .. }
            | Self::Transport { url, .. } => url,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] ::url::ParseError),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, HarvestReport};
pub use model::{EntityReference, ExtractedFields, Field, Record, SubItemReference};
pub use state::RunPhase;
