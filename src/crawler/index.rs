//! Index resolution
//!
//! The index page lists every entity as an option of a selection control.
//! Incidental small dropdowns share the page, so the entity selector is the
//! first `<select>` holding more than `min-index-options` options.

use crate::config::SiteConfig;
use crate::crawler::fetcher::{DocumentFetcher, Page};
use crate::crawler::retry::{retry, RetryPolicy, Sleeper};
use crate::model::EntityReference;
use crate::url::{compose_entity_url, parse_base_url};
use crate::{HarvestError, UrlError};
use scraper::Selector;

/// Fetches the index page and extracts the entity list
///
/// # Returns
///
/// * `Ok(Vec<EntityReference>)` - Entities sorted case-insensitively by name
/// * `Err(HarvestError::IndexUnavailable)` - The page could not be fetched
///   or carries no qualifying selection control
pub async fn resolve_index(
    fetcher: &DocumentFetcher,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    site: &SiteConfig,
) -> Result<Vec<EntityReference>, HarvestError> {
    let base_url = parse_base_url(&site.base_url).map_err(|e| HarvestError::IndexUnavailable {
        reason: format!("invalid base URL '{}': {}", site.base_url, e),
    })?;

    let page = match retry(policy, sleeper, "index page", || fetcher.fetch(&base_url)).await {
        Ok(Some(page)) => page,
        Ok(None) => {
            return Err(HarvestError::IndexUnavailable {
                reason: format!("index page {} not found", base_url),
            })
        }
        Err(e) => {
            return Err(HarvestError::IndexUnavailable {
                reason: e.to_string(),
            })
        }
    };

    let entities = extract_entities(&page, site)?;
    tracing::info!(
        url = %base_url,
        entities = entities.len(),
        "Resolved entity index"
    );
    Ok(entities)
}

/// Extracts entity references from an already fetched index page
///
/// # Extraction Rules
///
/// - The selector is the first `<select>` with more than `min-index-options` options
/// - Placeholder options (see [`SiteConfig::is_placeholder`]) and blank options are skipped
/// - A non-blank `value` attribute is resolved against the page URL; otherwise the
///   URL is composed from `entity-path` and the percent-encoded name
/// - The result is sorted case-insensitively by display name; duplicates are kept
pub fn extract_entities(page: &Page, site: &SiteConfig) -> Result<Vec<EntityReference>, HarvestError> {
    let (Ok(select_selector), Ok(option_selector)) =
        (Selector::parse("select"), Selector::parse("option"))
    else {
        return Err(HarvestError::IndexUnavailable {
            reason: "selector syntax rejected".to_string(),
        });
    };

    let document = page.document();

    let select = document
        .select(&select_selector)
        .find(|select| select.select(&option_selector).count() > site.min_index_options)
        .ok_or_else(|| HarvestError::IndexUnavailable {
            reason: format!(
                "no selection control with more than {} options on {}",
                site.min_index_options,
                page.url()
            ),
        })?;

    let mut entities = Vec::new();

    for option in select.select(&option_selector) {
        let name = option.text().collect::<String>().trim().to_string();

        if name.is_empty() || site.is_placeholder(&name) {
            tracing::debug!(option = %name, "Skipping placeholder option");
            continue;
        }

        let explicit = option
            .value()
            .attr("value")
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let url = match explicit {
            Some(value) => page.url().join(value).map_err(UrlError::from),
            None => compose_entity_url(page.url(), &site.entity_path, &name),
        };

        match url {
            Ok(url) => entities.push(EntityReference::new(name, url)),
            Err(e) => {
                tracing::warn!(option = %name, error = %e, "Skipping option with unusable link");
            }
        }
    }

    entities.sort_by_key(|entity| entity.display_name.to_lowercase());

    Ok(entities)
}
