//! Sub-item detail parsing
//!
//! Detail pages carry their values as `Label: value` lines. Extraction goes
//! through the [`FieldExtractor`] capability so that another page layout only
//! needs another extractor.

use crate::crawler::fetcher::{DocumentFetcher, Page};
use crate::model::{ExtractedFields, Field};
use crate::FetchError;
use regex::Regex;
use url::Url;

/// Capability to turn a fetched detail page into field values
///
/// Implementations never fail: a value they cannot find stays empty.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, page: &Page) -> ExtractedFields;
}

/// Extracts `Label: value` pairs from the page text
///
/// For each field, the first occurrence of its label (case-sensitive, at a
/// word boundary) followed by a colon wins; the value is the rest of that
/// line, trimmed. Whitespace between label, colon and value may span lines,
/// since label and value often sit in separate elements.
#[derive(Debug, Clone)]
pub struct LabelPatternExtractor {
    patterns: Vec<(Field, Regex)>,
}

impl LabelPatternExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = Field::ALL
            .iter()
            .map(|&field| {
                let pattern = format!(r"\b{}\s*:\s*(.+)", regex::escape(field.label()));
                Regex::new(&pattern).map(|regex| (field, regex))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Extracts every field from plain page text
    pub fn extract_from_text(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::new();

        for (field, regex) in &self.patterns {
            if let Some(value) = regex.captures(text).and_then(|caps| caps.get(1)) {
                // an empty value cell lets the pattern run on into the next label
                if !starts_with_label(value.as_str()) {
                    fields.set(*field, value.as_str());
                }
            }
        }

        fields
    }
}

fn starts_with_label(value: &str) -> bool {
    Field::ALL.iter().any(|field| {
        value
            .strip_prefix(field.label())
            .is_some_and(|rest| rest.trim_start().starts_with(':'))
    })
}

impl FieldExtractor for LabelPatternExtractor {
    fn extract(&self, page: &Page) -> ExtractedFields {
        self.extract_from_text(&page.text())
    }
}

/// Fetches one sub-item page and extracts its fields
///
/// Issues a single request; the caller wraps it in the retrier, which turns
/// `FetchError::NotFound` into an absent page (all fields empty).
pub async fn parse_details(
    fetcher: &DocumentFetcher,
    url: &Url,
    extractor: &dyn FieldExtractor,
) -> Result<ExtractedFields, FetchError> {
    let page = fetcher.fetch(url).await?;
    let fields = extractor.extract(&page);

    if fields.filled() < Field::COUNT {
        let missing: Vec<_> = fields
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field.label())
            .collect();
        tracing::debug!(url = %url, missing = ?missing, "Detail page lacks some fields");
    }

    Ok(fields)
}
