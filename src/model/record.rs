use crate::model::fields::{ExtractedFields, Field};
use url::Url;

/// Column headers of the tabular output, in order
pub const COLUMN_HEADERS: [&str; 2 + Field::COUNT] = [
    "Selected plant from drop-down:",
    "Processed Phytochemical Name",
    "SMILES",
    "InChI",
    "InChIKey",
    "DeepSMILES",
];

/// An entity listed on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    /// Name as shown in the index selector
    pub display_name: String,

    /// Absolute URL of the entity page
    pub url: Url,
}

impl EntityReference {
    pub fn new(display_name: impl Into<String>, url: Url) -> Self {
        Self {
            display_name: display_name.into(),
            url,
        }
    }
}

/// A sub-item linked from an entity page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubItemReference {
    /// Visible link text
    pub label: String,

    /// Absolute URL of the sub-item page
    pub url: Url,
}

/// One output row: a sub-item of an entity together with its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub entity_name: String,
    pub sub_item_label: String,
    pub fields: ExtractedFields,
}

impl Record {
    pub fn new(
        entity_name: impl Into<String>,
        sub_item_label: impl Into<String>,
        fields: ExtractedFields,
    ) -> Self {
        Self {
            entity_name: entity_name.into(),
            sub_item_label: sub_item_label.into(),
            fields,
        }
    }

    /// The record as a row of cells in [`COLUMN_HEADERS`] order
    pub fn to_row(&self) -> Vec<&str> {
        let mut row = Vec::with_capacity(COLUMN_HEADERS.len());
        row.push(self.entity_name.as_str());
        row.push(self.sub_item_label.as_str());
        row.extend(self.fields.iter().map(|(_, value)| value));
        row
    }
}
