//! Line-based parser for the model's `key: value` reply.
//!
//! Parsing never fails. Lines without a colon are dropped until a
//! `product_summary_text` key has been seen; from then on each one is appended to
//! the summary, even after later keys. The first colon on a line separates key
//! from value, so values may themselves contain colons (URLs, times).

use tracing::debug;

use crate::fields::{EnrichmentFields, PRODUCT_SUMMARY};

/// Parse a raw completion into [`EnrichmentFields`].
pub fn parse_response(raw: &str) -> EnrichmentFields {
    let text = raw.replace("\r\n", "\n");
    let mut fields = EnrichmentFields::new();
    let mut summary: Vec<&str> = Vec::new();
    let mut in_summary = false;

    for line in text.trim().lines() {
        let Some((key, value)) = line.split_once(':') else {
            let continuation = line.trim();
            if in_summary && !continuation.is_empty() {
                summary.push(continuation);
            }
            continue;
        };

        let key = key.trim().to_lowercase();
        let value = value.trim();

        if key == PRODUCT_SUMMARY {
            in_summary = true;
            if !value.is_empty() {
                summary.push(value);
            }
        } else {
            fields.insert(key, value);
        }
    }

    if in_summary || !summary.is_empty() {
        fields.insert(PRODUCT_SUMMARY, summary.join(" "));
    }

    debug!(keys = fields.len(), "parsed model response");
    fields
}
