//! Language model access for enrichment.
//!
//! The pipeline talks to a [`LanguageModel`]; [`OpenAiClient`] is the
//! production implementation over an OpenAI-compatible REST API.

mod openai;

use async_trait::async_trait;
use licensee_shared::Result;

pub use openai::{OpenAiClient, OpenAiSettings};

/// Text completion and embedding provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-turn, non-streaming completion with `prompt` as the only message.
    async fn complete(&self, prompt: &str, temperature: f32, max_output_tokens: u32)
    -> Result<String>;

    /// Embedding vector for `text`. Dimensionality is fixed per model.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
