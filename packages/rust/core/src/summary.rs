//! Templated summaries and commentaries derived from enrichment fields.

use serde::{Deserialize, Serialize};

use crate::fields::{
    AGE_GROUP, AUDIENCE_DESCRIPTION, BUSINESS_CATEGORY, COMPETITORS, COUNTRIES,
    DISTRIBUTION_CHANNELS, EnrichmentFields, INDUSTRY_CLASSIFICATION, LICENSING_AGREEMENTS,
    POPULAR_PRODUCTS, PRICE_POSITIONING, PRIMARY_CATEGORY, SECONDARY_CATEGORY,
};

/// The ten generated texts. Field names are also the persisted column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySet {
    pub audience_summary: String,
    pub product_summary: String,
    pub market_fit_summary: String,
    pub competitive_differentiation_summary: String,
    pub combined_strategic_summary: String,
    pub opportunity_alignment_score_commentary: String,
    pub market_readiness_commentary: String,
    pub audience_product_harmony_analysis: String,
    pub competitive_strength_analysis: String,
    pub strategic_fit_commentary: String,
}

impl SummarySet {
    /// Fill every template from `fields`. Absent or blank values render as `N/A`.
    pub fn generate(fields: &EnrichmentFields, brand_name: &str) -> Self {
        let f = |key: &'static str| fields.display(key);
        let brand = brand_name.trim();

        Self {
            audience_summary: format!(
                "This company targets {} consumers, focusing on {} across {}. {}",
                f(AGE_GROUP),
                f(BUSINESS_CATEGORY),
                f(COUNTRIES),
                f(AUDIENCE_DESCRIPTION),
            ),
            product_summary: format!(
                "They specialize in {}, with licensing focus areas in {} and {}.",
                f(POPULAR_PRODUCTS),
                f(PRIMARY_CATEGORY),
                f(SECONDARY_CATEGORY),
            ),
            market_fit_summary: format!(
                "Distributed across {}, their products are positioned as {} offerings through {} channels.",
                f(COUNTRIES),
                f(PRICE_POSITIONING),
                f(DISTRIBUTION_CHANNELS),
            ),
            competitive_differentiation_summary: format!(
                "Compared to {}, they differentiate by focusing on {} with notable licensing agreements including {}.",
                f(COMPETITORS),
                f(INDUSTRY_CLASSIFICATION),
                f(LICENSING_AGREEMENTS),
            ),
            combined_strategic_summary: format!(
                "{brand} is a company specializing in {} ({} and {}) distributed across {}. \
They target {} consumers ({}) through {} channels, offering {} products. \
Competitively, they stand out versus {} by focusing on {} with key licensing agreements like {}.",
                f(POPULAR_PRODUCTS),
                f(PRIMARY_CATEGORY),
                f(SECONDARY_CATEGORY),
                f(COUNTRIES),
                f(AGE_GROUP),
                f(AUDIENCE_DESCRIPTION),
                f(DISTRIBUTION_CHANNELS),
                f(PRICE_POSITIONING),
                f(COMPETITORS),
                f(INDUSTRY_CLASSIFICATION),
                f(LICENSING_AGREEMENTS),
            ),
            opportunity_alignment_score_commentary: format!(
                "Based on {brand}'s focus on {}, they show potential for licensing opportunities in the {} and {} categories. \
Their target demographic of {} aligns with current market trends, and their existing distribution across {} \
suggests capacity for expanded licensing partnerships.",
                f(BUSINESS_CATEGORY),
                f(PRIMARY_CATEGORY),
                f(SECONDARY_CATEGORY),
                f(AGE_GROUP),
                f(COUNTRIES),
            ),
            market_readiness_commentary: format!(
                "{brand} demonstrates market readiness through their established {} positioning and presence in {}. \
Their experience with {} indicates familiarity with licensing processes. \
Their current position in the {} market provides a foundation for licensing expansion.",
                f(PRICE_POSITIONING),
                f(DISTRIBUTION_CHANNELS),
                f(LICENSING_AGREEMENTS),
                f(INDUSTRY_CLASSIFICATION),
            ),
            audience_product_harmony_analysis: format!(
                "The harmony between {brand}'s products and their target audience of {} is evident in their specialization in {}. \
Their understanding of {} enables them to create products that resonate with consumer preferences \
and lifestyle needs in the {} category.",
                f(AGE_GROUP),
                f(POPULAR_PRODUCTS),
                f(AUDIENCE_DESCRIPTION),
                f(PRIMARY_CATEGORY),
            ),
            competitive_strength_analysis: format!(
                "In comparison to {}, {brand} differentiates through their focus on {}. \
Their strength in {} positions them uniquely in the market. \
Their {} strategy gives them competitive advantage with their target {} across {}.",
                f(COMPETITORS),
                f(INDUSTRY_CLASSIFICATION),
                f(PRIMARY_CATEGORY),
                f(PRICE_POSITIONING),
                f(AGE_GROUP),
                f(COUNTRIES),
            ),
            strategic_fit_commentary: format!(
                "{brand} exhibits strategic fit for licensing opportunities through their established brand identity in {}, \
market presence across {}, and experience with {}. \
Their focus on {} and {} categories allows for natural brand extensions that would resonate with their {}.",
                f(BUSINESS_CATEGORY),
                f(COUNTRIES),
                f(LICENSING_AGREEMENTS),
                f(PRIMARY_CATEGORY),
                f(SECONDARY_CATEGORY),
                f(AGE_GROUP),
            ),
        }
    }

    /// `(name, text)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("audience_summary", self.audience_summary.as_str()),
            ("product_summary", self.product_summary.as_str()),
            ("market_fit_summary", self.market_fit_summary.as_str()),
            (
                "competitive_differentiation_summary",
                self.competitive_differentiation_summary.as_str(),
            ),
            ("combined_strategic_summary", self.combined_strategic_summary.as_str()),
            (
                "opportunity_alignment_score_commentary",
                self.opportunity_alignment_score_commentary.as_str(),
            ),
            ("market_readiness_commentary", self.market_readiness_commentary.as_str()),
            (
                "audience_product_harmony_analysis",
                self.audience_product_harmony_analysis.as_str(),
            ),
            ("competitive_strength_analysis", self.competitive_strength_analysis.as_str()),
            ("strategic_fit_commentary", self.strategic_fit_commentary.as_str()),
        ]
        .into_iter()
    }
}
