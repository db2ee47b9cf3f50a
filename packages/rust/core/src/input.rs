//! CSV input for batch submissions.
//!
//! A header row is required. `uid`, `brand_name` and `website` columns must be
//! present; `contact`, `email` and `headquarters` are optional and any other
//! column is ignored. Cells are trimmed and short rows read as empty cells.

use std::io::Read;

use licensee_shared::{InputRow, LicenseeError, Result};
use tracing::debug;

/// Columns every batch CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["uid", "brand_name", "website"];

/// Header positions of the known columns.
struct ColumnIndex {
    uid: usize,
    brand_name: usize,
    website: usize,
    contact: Option<usize>,
    email: Option<usize>,
    headquarters: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(LicenseeError::validation(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let required = |name: &str| {
            position(name).ok_or_else(|| {
                LicenseeError::validation(format!("missing required columns: {name}"))
            })
        };

        Ok(Self {
            uid: required("uid")?,
            brand_name: required("brand_name")?,
            website: required("website")?,
            contact: position("contact"),
            email: position("email"),
            headquarters: position("headquarters"),
        })
    }

    fn row(&self, record: &csv::StringRecord) -> InputRow {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };

        InputRow {
            uid: cell(Some(self.uid)),
            brand_name: cell(Some(self.brand_name)),
            contact: cell(self.contact),
            email: cell(self.email),
            website: cell(Some(self.website)),
            headquarters: cell(self.headquarters),
        }
    }
}

/// Read every row from a CSV source (file, stdin, ...).
pub fn read_rows<R: Read>(source: R) -> Result<Vec<InputRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| LicenseeError::Csv(e.to_string()))?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LicenseeError::Csv(e.to_string()))?;
        rows.push(columns.row(&record));
    }

    debug!(rows = rows.len(), "read CSV input");
    Ok(rows)
}

/// Parse pasted CSV text.
pub fn parse_rows_str(text: &str) -> Result<Vec<InputRow>> {
    read_rows(text.as_bytes())
}
