//! Embedding vectors for the six strategy texts.

use licensee_llm::LanguageModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::summary::SummarySet;

/// Vectors for the embedded summaries. `None` means skipped or failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSet {
    pub combined_strategic_summary_embedding: Option<Vec<f32>>,
    pub opportunity_alignment_score_commentary_embedding: Option<Vec<f32>>,
    pub market_readiness_commentary_embedding: Option<Vec<f32>>,
    pub audience_product_harmony_analysis_embedding: Option<Vec<f32>>,
    pub competitive_strength_analysis_embedding: Option<Vec<f32>>,
    pub strategic_fit_commentary_embedding: Option<Vec<f32>>,
}

impl EmbeddingSet {
    /// `(column, vector)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&[f32]>)> {
        [
            (
                "combined_strategic_summary_embedding",
                self.combined_strategic_summary_embedding.as_deref(),
            ),
            (
                "opportunity_alignment_score_commentary_embedding",
                self.opportunity_alignment_score_commentary_embedding.as_deref(),
            ),
            (
                "market_readiness_commentary_embedding",
                self.market_readiness_commentary_embedding.as_deref(),
            ),
            (
                "audience_product_harmony_analysis_embedding",
                self.audience_product_harmony_analysis_embedding.as_deref(),
            ),
            (
                "competitive_strength_analysis_embedding",
                self.competitive_strength_analysis_embedding.as_deref(),
            ),
            (
                "strategic_fit_commentary_embedding",
                self.strategic_fit_commentary_embedding.as_deref(),
            ),
        ]
        .into_iter()
    }

    /// Number of vectors present.
    pub fn present(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Embed the six designated texts, one call each, in column order.
///
/// Failures are logged and leave that vector absent; they never fail the record.
#[instrument(skip_all)]
pub async fn generate_embeddings(model: &dyn LanguageModel, summaries: &SummarySet) -> EmbeddingSet {
    EmbeddingSet {
        combined_strategic_summary_embedding: embed_one(
            model,
            "combined_strategic_summary",
            &summaries.combined_strategic_summary,
        )
        .await,
        opportunity_alignment_score_commentary_embedding: embed_one(
            model,
            "opportunity_alignment_score_commentary",
            &summaries.opportunity_alignment_score_commentary,
        )
        .await,
        market_readiness_commentary_embedding: embed_one(
            model,
            "market_readiness_commentary",
            &summaries.market_readiness_commentary,
        )
        .await,
        audience_product_harmony_analysis_embedding: embed_one(
            model,
            "audience_product_harmony_analysis",
            &summaries.audience_product_harmony_analysis,
        )
        .await,
        competitive_strength_analysis_embedding: embed_one(
            model,
            "competitive_strength_analysis",
            &summaries.competitive_strength_analysis,
        )
        .await,
        strategic_fit_commentary_embedding: embed_one(
            model,
            "strategic_fit_commentary",
            &summaries.strategic_fit_commentary,
        )
        .await,
    }
}

async fn embed_one(model: &dyn LanguageModel, name: &str, text: &str) -> Option<Vec<f32>> {
    if text.trim().is_empty() {
        debug!(field = name, "skipping embedding for blank text");
        return None;
    }

    match model.embed(text).await {
        Ok(vector) if !vector.is_empty() => Some(vector),
        Ok(_) => {
            warn!(field = name, "embedding came back empty");
            None
        }
        Err(e) => {
            warn!(field = name, error = %e, "embedding failed");
            None
        }
    }
}
