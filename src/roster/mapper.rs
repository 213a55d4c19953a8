use std::collections::{BTreeMap, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The fields a roster column can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    FirstName,
    LastName,
    PhoneNumber,
    Email,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::FirstName => "first_name",
            CanonicalField::LastName => "last_name",
            CanonicalField::PhoneNumber => "phone_number",
            CanonicalField::Email => "email",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headers recognized when the config does not supply its own table.
pub static DEFAULT_HEADER_SYNONYMS: Lazy<BTreeMap<String, CanonicalField>> = Lazy::new(|| {
    use CanonicalField::*;
    [
        ("Name", Name),
        ("Client name", Name),
        ("First Name", FirstName),
        ("Client first name", FirstName),
        ("Last Name", LastName),
        ("Client last name", LastName),
        ("Phone Number", PhoneNumber),
        ("Client phone number", PhoneNumber),
        ("Phone", PhoneNumber),
        ("Email", Email),
        ("Client email", Email),
    ]
    .into_iter()
    .map(|(header, field)| (header.to_string(), field))
    .collect()
});

/// Translates human-authored column headers into canonical fields.
///
/// Matching is exact and case-sensitive after trimming surrounding
/// whitespace on both the table keys and the looked-up header.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    table: HashMap<String, CanonicalField>,
}

impl ColumnMapper {
    pub fn new<I, S>(synonyms: I) -> Self
    where
        I: IntoIterator<Item = (S, CanonicalField)>,
        S: AsRef<str>,
    {
        let table = synonyms
            .into_iter()
            .map(|(header, field)| (header.as_ref().trim().to_string(), field))
            .collect();
        Self { table }
    }

    /// `None` means the header is unrecognized and its column is ignored.
    pub fn resolve(&self, header: &str) -> Option<CanonicalField> {
        self.table.get(header.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_SYNONYMS.iter().map(|(h, f)| (h.as_str(), *f)))
    }
}
