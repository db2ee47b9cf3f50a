//! Keyword re-scoring of licensing categories.
//!
//! Grounds the model's primary/secondary category guess in how often each
//! taxonomy entry is mentioned in `product_summary_text`.

use regex::Regex;
use tracing::{debug, warn};

use crate::fields::{EnrichmentFields, PRIMARY_CATEGORY, PRODUCT_SUMMARY, SECONDARY_CATEGORY};

/// Occurrences of one taxonomy category in the summary text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScore {
    pub category: String,
    pub count: usize,
}

/// Whole-token patterns for every taxonomy category, compiled once.
///
/// Build one per batch and reuse it for every record.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    patterns: Vec<(String, Option<Regex>)>,
}

impl CategoryMatcher {
    /// Compile a pattern per category. A category whose pattern fails to
    /// compile is kept in order and always scores zero.
    pub fn new(taxonomy: &[String]) -> Self {
        let patterns = taxonomy
            .iter()
            .map(|category| {
                let term = regex::escape(&category.to_lowercase());
                let pattern = match Regex::new(&format!(r"(?:^|\W){term}(?:$|\W)")) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(category = %category, error = %e, "skipping unmatchable category");
                        None
                    }
                };
                (category.clone(), pattern)
            })
            .collect();
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Count each category in `text`, highest count first.
    ///
    /// Matching is case-insensitive and bounded by start/end of text or a non-word
    /// character on both sides, so "bags" matches "tote bags!" but not "bagsworth".
    /// Occurrences are non-overlapping. Ties keep taxonomy order.
    pub fn score(&self, text: &str) -> Vec<CategoryScore> {
        let haystack = text.to_lowercase();
        let mut scores: Vec<CategoryScore> = self
            .patterns
            .iter()
            .map(|(category, pattern)| CategoryScore {
                category: category.clone(),
                count: pattern
                    .as_ref()
                    .map_or(0, |re| re.find_iter(&haystack).count()),
            })
            .collect();

        // sort_by is stable
        scores.sort_by(|a, b| b.count.cmp(&a.count));
        scores
    }

    /// Override primary/secondary licensing categories from keyword scores.
    ///
    /// The top category replaces the primary when its count is positive; the
    /// runner-up replaces the secondary likewise. Zero counts leave the model's
    /// answers untouched.
    pub fn apply(&self, fields: &mut EnrichmentFields) {
        let text = fields.get(PRODUCT_SUMMARY).unwrap_or_default();
        let scores = self.score(text);

        if let Some(top) = scores.first().filter(|s| s.count > 0) {
            debug!(category = %top.category, count = top.count, "overriding primary category");
            fields.insert(PRIMARY_CATEGORY, top.category.clone());
        }
        if let Some(second) = scores.get(1).filter(|s| s.count > 0) {
            debug!(category = %second.category, count = second.count, "overriding secondary category");
            fields.insert(SECONDARY_CATEGORY, second.category.clone());
        }
    }
}

/// Score `text` against a one-off matcher. See [`CategoryMatcher::score`].
pub fn score_categories(text: &str, taxonomy: &[String]) -> Vec<CategoryScore> {
    CategoryMatcher::new(taxonomy).score(text)
}

/// One-off form of [`CategoryMatcher::apply`].
pub fn apply_category_override(fields: &mut EnrichmentFields, taxonomy: &[String]) {
    CategoryMatcher::new(taxonomy).apply(fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::default_taxonomy;

    fn taxonomy(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_and_orders_by_frequency() {
        let scores = score_categories(
            "we sell tote bags and sun hats and more bags",
            &taxonomy(&["Hats", "Bags"]),
        );
        assert_eq!(scores[0], CategoryScore { category: "Bags".into(), count: 2 });
        assert_eq!(scores[1], CategoryScore { category: "Hats".into(), count: 1 });
    }

    #[test]
    fn whole_token_matching() {
        let tax = taxonomy(&["Bags"]);
        assert_eq!(score_categories("Tote Bags!", &tax)[0].count, 1);
        assert_eq!(score_categories("Bagsworth Inc", &tax)[0].count, 0);
        assert_eq!(score_categories("handbags", &tax)[0].count, 0);
    }

    #[test]
    fn adjacent_matches_share_no_separator() {
        // the separating space is consumed by the first match
        let tax = taxonomy(&["Bags"]);
        assert_eq!(score_categories("bags bags bags", &tax)[0].count, 2);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let tax = taxonomy(&["Ties / Bowties", "Buckles & Accessories", "Men's T-Shirts"]);
        let scores = score_categories("men's t-shirts, ties / bowties.", &tax);
        let count = |name: &str| scores.iter().find(|s| s.category == name).unwrap().count;
        assert_eq!(count("Ties / Bowties"), 1);
        assert_eq!(count("Men's T-Shirts"), 1);
        assert_eq!(count("Buckles & Accessories"), 0);
    }

    #[test]
    fn ties_keep_taxonomy_order() {
        let scores = score_categories("hats and bags", &taxonomy(&["Hats", "Bags", "Belts"]));
        let order: Vec<_> = scores.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(order, ["Hats", "Bags", "Belts"]);
    }

    #[test]
    fn override_replaces_primary_and_secondary() {
        let mut fields = EnrichmentFields::new();
        fields.insert(PRODUCT_SUMMARY, "we sell tote bags and sun hats and more bags");
        fields.insert(PRIMARY_CATEGORY, "Apparel");
        fields.insert(SECONDARY_CATEGORY, "Footwear");

        apply_category_override(&mut fields, &taxonomy(&["Bags", "Hats"]));
        assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Bags"));
        assert_eq!(fields.get(SECONDARY_CATEGORY), Some("Hats"));
    }

    #[test]
    fn single_hit_overrides_primary_only() {
        let mut fields = EnrichmentFields::new();
        fields.insert(PRODUCT_SUMMARY, "sun hats");
        fields.insert(PRIMARY_CATEGORY, "Apparel");
        fields.insert(SECONDARY_CATEGORY, "Footwear");

        apply_category_override(&mut fields, &taxonomy(&["Bags", "Hats"]));
        assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Hats"));
        assert_eq!(fields.get(SECONDARY_CATEGORY), Some("Footwear"));
    }

    #[test]
    fn no_hits_leave_model_answer() {
        let mut fields = EnrichmentFields::new();
        fields.insert(PRODUCT_SUMMARY, "enterprise database software");
        fields.insert(PRIMARY_CATEGORY, "Electronics & Accessories");

        apply_category_override(&mut fields, &default_taxonomy());
        assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Electronics & Accessories"));
        assert!(!fields.contains(SECONDARY_CATEGORY));
    }

    #[test]
    fn missing_summary_is_no_op() {
        let mut fields = EnrichmentFields::new();
        fields.insert(PRIMARY_CATEGORY, "Hats");
        apply_category_override(&mut fields, &default_taxonomy());
        assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Hats"));
    }

    #[test]
    fn matcher_is_reusable_across_records() {
        let tax = default_taxonomy();
        let matcher = CategoryMatcher::new(&tax);
        assert_eq!(matcher.len(), tax.len());

        let texts = [
            "caps, backpacks and more backpacks",
            "enterprise database software",
            "Wallets. Wallets! wallets?",
        ];
        for text in texts {
            assert_eq!(matcher.score(text), score_categories(text, &tax), "{text}");
        }
        assert_eq!(matcher.score(texts[0]), matcher.score(texts[0]));
        assert_eq!(matcher.score(texts[2])[0].category, "Wallets");
    }

    #[test]
    fn matcher_apply_matches_one_off_override() {
        let matcher = CategoryMatcher::new(&taxonomy(&["Bags", "Hats"]));
        let mut fields = EnrichmentFields::new();
        fields.insert(PRODUCT_SUMMARY, "sun hats, tote bags and beach bags");
        fields.insert(PRIMARY_CATEGORY, "Apparel");

        let mut expected = fields.clone();
        apply_category_override(&mut expected, &taxonomy(&["Bags", "Hats"]));
        matcher.apply(&mut fields);

        assert_eq!(fields.get(PRIMARY_CATEGORY), Some("Bags"));
        assert_eq!(fields.get(SECONDARY_CATEGORY), Some("Hats"));
        assert_eq!(fields, expected);
    }
}
