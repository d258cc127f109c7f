//! URL handling module for Catalog-Harvest
//!
//! Catalog pages link to each other with relative hrefs; this module turns
//! them into absolute URLs and composes the conventional entity URL used when
//! an index option carries no explicit link.

mod resolve;

pub use resolve::{compose_entity_url, parse_base_url, resolve_link};
