use std::fmt;

/// The fixed set of fields read from every sub-item page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Smiles,
    InChI,
    InChIKey,
    DeepSmiles,
}

impl Field {
    pub const COUNT: usize = 4;

    /// All fields in output column order
    pub const ALL: [Field; Field::COUNT] = [
        Field::Smiles,
        Field::InChI,
        Field::InChIKey,
        Field::DeepSmiles,
    ];

    /// The label this field carries on a page, which is also its column header
    pub fn label(self) -> &'static str {
        match self {
            Self::Smiles => "SMILES",
            Self::InChI => "InChI",
            Self::InChIKey => "InChIKey",
            Self::DeepSmiles => "DeepSMILES",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Smiles => 0,
            Self::InChI => 1,
            Self::InChIKey => 2,
            Self::DeepSmiles => 3,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Values extracted from one sub-item page
///
/// Every field always has a value; a field missing from the page is the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    values: [String; Field::COUNT],
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Stores a value, trimmed
    pub fn set(&mut self, field: Field, value: impl AsRef<str>) {
        self.values[field.index()] = value.as_ref().trim().to_string();
    }

    /// Builder-style variant of [`ExtractedFields::set`]
    pub fn with(mut self, field: Field, value: impl AsRef<str>) -> Self {
        self.set(field, value);
        self
    }

    /// Iterates over `(field, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL.iter().map(move |&field| (field, self.get(field)))
    }

    /// Returns true if no field carries a value
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(String::is_empty)
    }

    /// Number of fields that carry a value
    pub fn filled(&self) -> usize {
        self.values.iter().filter(|v| !v.is_empty()).count()
    }
}
