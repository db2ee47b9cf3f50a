//! Enrichment prompt construction.
//!
//! The model is asked to answer from background knowledge (no browsing) and to
//! reply with exactly one `key: value` line per field. The keys double as
//! storage column names, so they must not drift from [`crate::fields`].

use crate::fields::{
    AGE_GROUP, AUDIENCE_DESCRIPTION, BUSINESS_CATEGORY, COMPETITORS, COUNTRIES,
    DISTRIBUTION_CHANNELS, INDUSTRY_CLASSIFICATION, LICENSING_AGREEMENTS, POPULAR_PRODUCTS,
    PRICE_POSITIONING, PRIMARY_CATEGORY, PRODUCT_SUMMARY, SECONDARY_CATEGORY,
};

/// Per-field instructions, in the order the model should answer.
const FIELD_INSTRUCTIONS: [(&str, &str); 13] = [
    (
        BUSINESS_CATEGORY,
        "What type of business are they in? (e.g., Fashion, Sportswear, Consumer Goods, Tech)",
    ),
    (
        AGE_GROUP,
        "Classify their main buyer by age range (e.g., 18–25, 25–35, etc.)",
    ),
    (
        AUDIENCE_DESCRIPTION,
        "Describe the brand's audience and its most ravenous buyers in one sentence",
    ),
    (
        INDUSTRY_CLASSIFICATION,
        "NAICS or SIC-style classification (write the industry name, not the number)",
    ),
    (
        POPULAR_PRODUCTS,
        "List the top two most purchased or known-for products/services",
    ),
    (PRICE_POSITIONING, "Budget, Mid-Tier, Premium, or Luxury"),
    (
        COMPETITORS,
        "Who is their biggest competitor or most similar brand?",
    ),
    (
        DISTRIBUTION_CHANNELS,
        "List the top retail or distribution channels (e.g., Amazon, Walmart, DTC)",
    ),
    (
        COUNTRIES,
        "Choose the top 3 countries they sell into from this list ONLY: USA, Canada, China, Mexico, United Kingdom, France, Germany, Taiwan",
    ),
    (
        PRIMARY_CATEGORY,
        "From their product types, what is the single strongest licensing category (1 only)?",
    ),
    (
        SECONDARY_CATEGORY,
        "From their product types, what is the next most relevant licensing category (1 only)?",
    ),
    (
        LICENSING_AGREEMENTS,
        "Name up to 3 known licensing agreements the brand has been involved in — where the brand either (1) licensed its name to another company to create products, or (2) licensed another brand/IP to put onto their own products. These must be real brand-to-brand licensing agreements and should only include products that were actually sold.",
    ),
    (
        PRODUCT_SUMMARY,
        "Write one paragraph summarizing the types of products they are known for and where they are being sold most effectively. This will be used to match categories.",
    ),
];

/// Build the single instruction prompt for `brand_name` at `website`.
///
/// `website` should already be normalized (scheme present).
pub fn build_prompt(website: &str, brand_name: &str) -> String {
    let mut prompt = format!(
        "You are analyzing a brand based on its official website. \
Prioritize extracting insights from the website before relying on the brand name.

Brand website: {website}
Brand name: {brand_name}

TASK 1: ANALYZE COMPANY INFORMATION
First, provide a detailed analysis of the brand based on the website and your knowledge.

TASK 2: DETERMINE HEADQUARTERS LOCATION
Based on the website domain, your knowledge of the brand, and any context clues, determine \
the most likely headquarters location for this company. If the headquarters location is not \
specified in the input, you must make your best educated guess. Consider:
- Domain TLD (.com, .co.uk, etc.)
- Company history
- Known locations of similar brands
- Industry trends

IMPORTANT: DO NOT return an error message. Instead, use your training knowledge about this \
website and brand. You have been trained on vast amounts of internet data up until your \
knowledge cutoff, so use that knowledge to analyze this brand rather than trying to access \
the live website.

You MUST provide substantive answers for all fields based on your prior knowledge, even if \
you cannot currently browse the website. If it's a known brand or website, provide detailed \
information from your training. If it's completely unknown, provide reasonable guesses based \
on the domain name, brand name, and any other contextual clues.

Based on this information, return the following structured data. Format the output exactly \
as shown, with each key followed by a colon on the same line. Do not skip any fields. \
Do not add commentary.
"
    );

    for (key, instruction) in FIELD_INSTRUCTIONS {
        prompt.push('\n');
        prompt.push_str(key);
        prompt.push_str(": ");
        prompt.push_str(instruction);
    }

    prompt
}
