//! The persisted licensee row.

use std::io::Write;

use licensee_shared::{LicenseeError, LicenseeInput, Result, normalize_website};
use licensee_storage::StoredRow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedding::EmbeddingSet;
use crate::fields::{
    AGE_GROUP, AUDIENCE_DESCRIPTION, BUSINESS_CATEGORY, COMPETITORS, COUNTRIES,
    DISTRIBUTION_CHANNELS, EnrichmentFields, INDUSTRY_CLASSIFICATION, LICENSING_AGREEMENTS,
    POPULAR_PRODUCTS, PRICE_POSITIONING, PRIMARY_CATEGORY, PRODUCT_SUMMARY, SECONDARY_CATEGORY,
};
use crate::summary::SummarySet;

/// Stored when the submitter gives no headquarters.
pub const UNKNOWN_HEADQUARTERS: &str = "Unknown";

/// Input, enrichment fields, summaries and embeddings under their column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub uid: String,
    pub brand_name: String,
    pub contact: Option<String>,
    /// Left out of the store row when absent, so tables without an `email`
    /// column accept records submitted without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub website: String,
    pub headquarters: String,

    pub business_category: String,
    pub age_group: String,
    pub audience_description: String,
    pub industry_classification: String,
    pub popular_type_of_product: String,
    pub price_positioning: String,
    pub brand_competitors: String,
    pub retail_distribution_channel: String,
    pub countries_distributed: String,
    pub primary_licensing_category: String,
    pub secondary_licensing_category: String,
    pub known_licensing_agreements: String,
    pub product: String,

    #[serde(flatten)]
    pub summaries: SummarySet,
    #[serde(flatten)]
    pub embeddings: EmbeddingSet,
}

impl PersistedRecord {
    /// Assemble the row. Missing fields become `N/A` here and nowhere earlier.
    pub fn build(
        input: &LicenseeInput,
        fields: &EnrichmentFields,
        summaries: SummarySet,
        embeddings: EmbeddingSet,
    ) -> Self {
        let field = |key: &'static str| fields.value_or_na(key).to_string();

        Self {
            uid: input.uid.clone(),
            brand_name: input.brand_name.clone(),
            contact: input.contact.clone(),
            email: input.email.clone(),
            website: normalize_website(&input.website),
            headquarters: input
                .headquarters
                .clone()
                .unwrap_or_else(|| UNKNOWN_HEADQUARTERS.to_string()),

            business_category: field(BUSINESS_CATEGORY),
            age_group: field(AGE_GROUP),
            audience_description: field(AUDIENCE_DESCRIPTION),
            industry_classification: field(INDUSTRY_CLASSIFICATION),
            popular_type_of_product: field(POPULAR_PRODUCTS),
            price_positioning: field(PRICE_POSITIONING),
            brand_competitors: field(COMPETITORS),
            retail_distribution_channel: field(DISTRIBUTION_CHANNELS),
            countries_distributed: field(COUNTRIES),
            primary_licensing_category: field(PRIMARY_CATEGORY),
            secondary_licensing_category: field(SECONDARY_CATEGORY),
            known_licensing_agreements: field(LICENSING_AGREEMENTS),
            product: field(PRODUCT_SUMMARY),

            summaries,
            embeddings,
        }
    }

    /// The record as a store row.
    pub fn to_row(&self) -> Result<StoredRow> {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(_) => Err(LicenseeError::Store("record did not serialize to a row".into())),
            Err(e) => Err(LicenseeError::Store(format!("failed to serialize record: {e}"))),
        }
    }

    /// Column names in export order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec![
            "uid",
            "brand_name",
            "contact",
            "email",
            "website",
            "headquarters",
            "business_category",
            "age_group",
            "audience_description",
            "industry_classification",
            "popular_type_of_product",
            "price_positioning",
            "brand_competitors",
            "retail_distribution_channel",
            "countries_distributed",
            "primary_licensing_category",
            "secondary_licensing_category",
            "known_licensing_agreements",
            "product",
        ];
        columns.extend(self.summaries.iter().map(|(name, _)| name));
        columns.extend(self.embeddings.iter().map(|(name, _)| name));
        columns
    }

    /// Write the record as a header plus one CSV row.
    ///
    /// Strings are written verbatim, absent values as empty cells and vectors
    /// as JSON arrays.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let row = self.to_row()?;
        let columns = self.columns();
        let mut csv = csv::Writer::from_writer(writer);

        csv.write_record(&columns).map_err(csv_err)?;
        csv.write_record(columns.iter().map(|c| cell(row.get(*c))))
            .map_err(csv_err)?;
        csv.flush()
            .map_err(|e| LicenseeError::Csv(format!("failed to flush CSV: {e}")))
    }
}

fn csv_err(e: csv::Error) -> LicenseeError {
    LicenseeError::Csv(e.to_string())
}

/// Render one JSON value as a CSV cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
