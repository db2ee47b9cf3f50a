//! Enrichment field keys and the parsed field map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder for any field the model did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

pub const BUSINESS_CATEGORY: &str = "business_category";
pub const AGE_GROUP: &str = "age_group";
pub const AUDIENCE_DESCRIPTION: &str = "audience_description";
pub const INDUSTRY_CLASSIFICATION: &str = "industry_classification";
pub const POPULAR_PRODUCTS: &str = "popular_products_or_services";
pub const PRICE_POSITIONING: &str = "price_positioning";
pub const COMPETITORS: &str = "brand_affinity_competitors";
pub const DISTRIBUTION_CHANNELS: &str = "retail_distribution_channels";
pub const COUNTRIES: &str = "countries_distributed";
pub const PRIMARY_CATEGORY: &str = "primary_licensing_category";
pub const SECONDARY_CATEGORY: &str = "secondary_licensing_category";
pub const LICENSING_AGREEMENTS: &str = "known_licensing_agreements";
pub const PRODUCT_SUMMARY: &str = "product_summary_text";

/// Every key the model is asked for, in prompt order.
pub const ENRICHMENT_KEYS: [&str; 13] = [
    BUSINESS_CATEGORY,
    AGE_GROUP,
    AUDIENCE_DESCRIPTION,
    INDUSTRY_CLASSIFICATION,
    POPULAR_PRODUCTS,
    PRICE_POSITIONING,
    COMPETITORS,
    DISTRIBUTION_CHANNELS,
    COUNTRIES,
    PRIMARY_CATEGORY,
    SECONDARY_CATEGORY,
    LICENSING_AGREEMENTS,
    PRODUCT_SUMMARY,
];

/// Free-text facts parsed from the model response, keyed by lower-cased field name.
///
/// Keys the model omitted are simply absent. Unknown keys are kept but unused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrichmentFields(BTreeMap<String, String>);

impl EnrichmentFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for `key`, if the model supplied one.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or [`NOT_AVAILABLE`] when the key is absent.
    pub fn value_or_na(&self, key: &str) -> &str {
        self.get(key).unwrap_or(NOT_AVAILABLE)
    }

    /// Value for `key`, or [`NOT_AVAILABLE`] when absent or blank.
    pub fn display(&self, key: &str) -> &str {
        match self.get(key) {
            Some(v) if !v.trim().is_empty() => v,
            _ => NOT_AVAILABLE,
        }
    }

    /// Set `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
