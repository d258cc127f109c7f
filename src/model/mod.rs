//! Data model for harvested catalog data
//!
//! - `EntityReference`: one entity listed on the index page
//! - `SubItemReference`: one sub-item linked from an entity page
//! - `Field` / `ExtractedFields`: the closed set of values read from a sub-item page
//! - `Record`: one fully resolved (entity, sub-item) row of the output

mod fields;
mod record;

pub use fields::{ExtractedFields, Field};
pub use record::{EntityReference, Record, SubItemReference, COLUMN_HEADERS};
