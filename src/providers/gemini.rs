//! Google Generative Language API client
//!
//! Embeddings via `models/{model}:embedContent`, generation via
//! `models/{model}:generateContent`. The API key travels in the
//! `x-goog-api-key` header and never appears in URLs, errors or logs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::ProviderError;
use crate::providers::{validate_embedding, EmbeddingProvider, GenerativeModel};

/// Default API endpoint
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default embedding model (768 dimensions)
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    dimension: usize,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client with default models
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_config(
            DEFAULT_GEMINI_URL,
            api_key,
            DEFAULT_MODEL,
            DEFAULT_EMBEDDING_MODEL,
            768,
        )
    }

    pub fn with_config(
        base_url: &str,
        api_key: impl Into<String>,
        model: &str,
        embedding_model: &str,
        dimension: usize,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            dimension,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<Req, Resp>(&self, url: &str, request: &Req) -> Result<Resp, ProviderError>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status {
                service: "gemini".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Gemini response: {}", e.without_url())))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let request = EmbedContentRequest {
            content: Content::from_text(text),
        };

        let response: EmbedContentResponse = self.post_json(&url, &request).await?;
        let values = response.embedding.values;
        validate_embedding(&values, self.dimension)?;

        debug!(model = %self.embedding_model, dim = values.len(), "gemini embedding");
        Ok(values)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = self.endpoint(&self.model, "generateContent");
        let request = GenerateContentRequest {
            contents: vec![Content::from_text(prompt)],
        };

        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        let text = response.text().ok_or_else(|| {
            ProviderError::MalformedResponse("Gemini returned no candidate text".to_string())
        })?;

        debug!(model = %self.model, chars = text.len(), "gemini generation");
        Ok(text)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn from_text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
