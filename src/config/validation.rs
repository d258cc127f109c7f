use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_site_config(&config.site)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler pacing configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.request_timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be >= 1ms".to_string(),
        ));
    }

    if config.retry_count < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_count must be >= 1, got {}",
            config.retry_count
        )));
    }

    if config.max_concurrent_details < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_details must be >= 1, got {}",
            config.max_concurrent_details
        )));
    }

    if config.batch_pause_min_ms > config.batch_pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "batch_pause_min_ms ({}) must not exceed batch_pause_max_ms ({})",
            config.batch_pause_min_ms, config.batch_pause_max_ms
        )));
    }

    Ok(())
}

/// Validates the site layout configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.sub_item_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sub_item_marker cannot be empty".to_string(),
        ));
    }

    if config.title_prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "title_prefix cannot be empty".to_string(),
        ));
    }

    if config.placeholder_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "placeholder_markers cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
