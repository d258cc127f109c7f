//! Entity page parsing
//!
//! An entity page names the entity and links to its sub-items. Sub-item links
//! are recognised by a site-specific marker in their visible text.

use crate::config::SiteConfig;
use crate::crawler::fetcher::{DocumentFetcher, Page};
use crate::model::SubItemReference;
use crate::url::resolve_link;
use crate::FetchError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Name used when a page offers neither a heading nor a title
pub const UNKNOWN_ENTITY: &str = "Unknown";

/// What an entity page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPage {
    pub canonical_name: String,
    pub sub_items: Vec<SubItemReference>,
}

/// Fetches one entity page and extracts its name and sub-item links
///
/// Issues a single request; the caller wraps it in the retrier, which turns
/// `FetchError::NotFound` into an absent page.
pub async fn parse_entity(
    fetcher: &DocumentFetcher,
    url: &Url,
    site: &SiteConfig,
) -> Result<EntityPage, FetchError> {
    let page = fetcher.fetch(url).await?;
    Ok(extract_entity(&page, site))
}

/// Extracts the canonical name and sub-item references from a fetched page
///
/// # Name Resolution
///
/// 1. Text of the first `<h1>`
/// 2. Text of `<title>`
/// 3. [`UNKNOWN_ENTITY`]
///
/// Sub-item URLs are resolved against the entity page's own URL.
pub fn extract_entity(page: &Page, site: &SiteConfig) -> EntityPage {
    let document = page.document();

    let canonical_name = first_text(&document, "h1")
        .or_else(|| first_text(&document, "title"))
        .unwrap_or_else(|| UNKNOWN_ENTITY.to_string());

    let sub_items = extract_sub_items(&document, page.url(), &site.sub_item_marker);

    if sub_items.is_empty() {
        tracing::debug!(url = %page.url(), "No sub-item links on entity page");
    }

    EntityPage {
        canonical_name,
        sub_items,
    }
}

/// Picks the name records are filed under
///
/// A page whose heading is just the site title says nothing about the
/// entity, so the name from the index wins in that case.
pub fn choose_entity_name(canonical_name: &str, display_name: &str, site: &SiteConfig) -> String {
    if site.has_title_prefix(canonical_name) {
        display_name.to_string()
    } else {
        canonical_name.to_string()
    }
}

/// Returns the whitespace-normalised text of the first element matching `css`
fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;

    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collects every link whose visible text carries `marker`
fn extract_sub_items(document: &Html, page_url: &Url, marker: &str) -> Vec<SubItemReference> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut sub_items = Vec::new();

    for element in document.select(&selector) {
        let text = element.text().collect::<String>();
        if !text.contains(marker) {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match resolve_link(href, page_url) {
            Some(url) => sub_items.push(SubItemReference {
                label: text.trim().to_string(),
                url,
            }),
            None => {
                tracing::debug!(href, "Skipping sub-item link that does not resolve");
            }
        }
    }

    sub_items
}
