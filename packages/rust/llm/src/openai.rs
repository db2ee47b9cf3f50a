//! OpenAI-compatible chat completion and embeddings client.

use std::time::Duration;

use async_trait::async_trait;
use licensee_shared::{LicenseeError, OpenAiConfig, Result};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::LanguageModel;

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("licensee-enrich/", env!("CARGO_PKG_VERSION"));

/// Resolved client settings. The API key is passed in, never read from env here.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub embedding_dimensions: Option<usize>,
    pub timeout: Duration,
}

impl OpenAiSettings {
    /// Build settings from the `[openai]` config section and a resolved key.
    pub fn from_config(config: &OpenAiConfig, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimensions: config.embedding_dimensions,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Async client for `/chat/completions` and `/embeddings`.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    completions_url: String,
    embeddings_url: String,
    model: String,
    embedding_model: String,
    embedding_dimensions: Option<usize>,
}

impl OpenAiClient {
    /// Build a client with bearer auth baked into the default headers.
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(LicenseeError::config("missing OpenAI API key"));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", settings.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| LicenseeError::config("invalid OpenAI API key"))?,
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LicenseeError::Model(format!("failed to build HTTP client: {e}")))?;

        let base = settings.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            completions_url: format!("{base}/chat/completions"),
            embeddings_url: format!("{base}/embeddings"),
            model: settings.model,
            embedding_model: settings.embedding_model,
            embedding_dimensions: settings.embedding_dimensions,
        })
    }

    /// POST `body` to `url` and decode a successful JSON response.
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| LicenseeError::Model(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LicenseeError::Model(format!(
                "{url}: HTTP {status}: {}",
                api_error_message(&text)
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| LicenseeError::Model(format!("{url}: malformed response: {e}")))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            temperature,
            max_tokens: max_output_tokens,
        };

        let parsed: ChatResponse = self.post_json(&self.completions_url, &request).await?;
        if let Some(usage) = &parsed.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "completion usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LicenseeError::Model("completion response had no content".into()))
    }

    #[instrument(skip_all, fields(model = %self.embedding_model, chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
            dimensions: self.embedding_dimensions,
        };

        let parsed: EmbeddingResponse = self.post_json(&self.embeddings_url, &request).await?;
        parsed
            .data
            .into_iter()
            .min_by_key(|entry| entry.index)
            .map(|entry| entry.embedding)
            .ok_or_else(|| LicenseeError::Model("embedding response had no vector".into()))
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> OpenAiSettings {
        OpenAiSettings {
            api_key: "sk-test".into(),
            base_url: base_url.into(),
            model: "gpt-4o".into(),
            embedding_model: "text-embedding-ada-002".into(),
            embedding_dimensions: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn rejects_empty_api_key() {
        let mut s = settings("http://localhost");
        s.api_key = "  ".into();
        assert!(OpenAiClient::new(s).is_err());
    }

    #[test]
    fn settings_from_config() {
        let s = OpenAiSettings::from_config(&OpenAiConfig::default(), "sk-1");
        assert_eq!(s.model, "gpt-4o");
        assert_eq!(s.timeout, Duration::from_secs(60));
    }

    #[test]
    fn api_error_message_prefers_structured_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }

    #[tokio::test]
    async fn complete_sends_single_system_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 500,
                "messages": [{"role": "system", "content": "describe acme"}],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "business_category: Fashion"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 4},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server.uri())).unwrap();
        let text = client.complete("describe acme", 0.7, 500).await.unwrap();
        assert_eq!(text, "business_category: Fashion");
    }

    #[tokio::test]
    async fn complete_surfaces_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "You exceeded your current quota"}
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server.uri())).unwrap();
        let err = client.complete("x", 0.7, 500).await.unwrap_err();
        assert!(matches!(err, LicenseeError::Model(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("exceeded your current quota"));
    }

    #[tokio::test]
    async fn complete_without_content_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server.uri())).unwrap();
        let err = client.complete("x", 0.7, 500).await.unwrap_err();
        assert!(err.to_string().contains("no content"));
    }

    #[tokio::test]
    async fn embed_returns_vector() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-ada-002",
                "input": "hello",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.25, -0.5, 1.0], "index": 0}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server.uri())).unwrap();
        let vector = client.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn embed_with_empty_data_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server.uri())).unwrap();
        assert!(client.embed("hello").await.is_err());
    }
}
