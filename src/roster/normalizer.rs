use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::api::models::RosterRow;
use crate::error::ImportError;
use crate::roster::mapper::{CanonicalField, ColumnMapper};
use crate::utils::strip_bom;

/// One input line keyed by its raw header, in column order.
pub type RawRow = Vec<(String, String)>;

/// Which name columns a deployment imports. Fixed per deployment, never
/// inferred from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSchema {
    #[default]
    Single,
    Split,
}

impl NameSchema {
    pub fn required(&self) -> &'static [CanonicalField] {
        match self {
            NameSchema::Single => &[CanonicalField::Name, CanonicalField::PhoneNumber],
            NameSchema::Split => &[
                CanonicalField::FirstName,
                CanonicalField::LastName,
                CanonicalField::PhoneNumber,
            ],
        }
    }

    fn keeps(&self, field: CanonicalField) -> bool {
        match field {
            CanonicalField::Name => *self == NameSchema::Single,
            CanonicalField::FirstName | CanonicalField::LastName => *self == NameSchema::Split,
            CanonicalField::PhoneNumber | CanonicalField::Email => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowNormalizer {
    mapper: ColumnMapper,
    schema: NameSchema,
}

impl RowNormalizer {
    pub fn new(mapper: ColumnMapper, schema: NameSchema) -> Self {
        Self { mapper, schema }
    }

    pub fn schema(&self) -> NameSchema {
        self.schema
    }

    /// Maps and trims one row. Returns `None` when a required field is
    /// missing or blank. Blank cells never overwrite an earlier value for
    /// the same field; otherwise the later column wins.
    pub fn normalize_row(&self, raw: &RawRow) -> Option<RosterRow> {
        let mut fields: HashMap<CanonicalField, String> = HashMap::new();
        for (header, value) in raw {
            let Some(field) = self.mapper.resolve(header) else {
                continue;
            };
            if !self.schema.keeps(field) {
                continue;
            }
            let value = value.trim();
            if !value.is_empty() {
                fields.insert(field, value.to_string());
            }
        }

        if let Some(missing) = self.schema.required().iter().find(|f| !fields.contains_key(*f)) {
            debug!("dropping row without {}", missing);
            return None;
        }

        Some(RosterRow {
            name: fields.remove(&CanonicalField::Name),
            first_name: fields.remove(&CanonicalField::FirstName),
            last_name: fields.remove(&CanonicalField::LastName),
            phone_number: fields.remove(&CanonicalField::PhoneNumber)?,
            email: fields.remove(&CanonicalField::Email),
        })
    }

    /// Keeps only the valid rows, in input order. Duplicates are kept.
    pub fn normalize<I>(&self, rows: I) -> Vec<RosterRow>
    where
        I: IntoIterator<Item = RawRow>,
    {
        rows.into_iter()
            .filter_map(|raw| self.normalize_row(&raw))
            .collect()
    }

    /// Parses a delimited file with a header row. Any malformed record fails
    /// the whole file; nothing is returned partially.
    pub fn parse(&self, bytes: &[u8], delimiter: u8) -> Result<Vec<RosterRow>, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| strip_bom(h).to_string())
            .collect();
        for header in &headers {
            if self.mapper.resolve(header).is_none() {
                debug!("ignoring unrecognized column {:?}", header);
            }
        }

        let mut raw_rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw: RawRow = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            raw_rows.push(raw);
        }

        let total = raw_rows.len();
        let rows = self.normalize(raw_rows);
        info!("normalized roster: {} of {} rows kept", rows.len(), total);
        Ok(rows)
    }

    pub async fn read_file(
        &self,
        path: &Path,
        delimiter: u8,
    ) -> Result<Vec<RosterRow>, ImportError> {
        let bytes = tokio::fs::read(path).await?;
        self.parse(&bytes, delimiter)
    }
}
