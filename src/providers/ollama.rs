//! Ollama API client
//!
//! Embeddings via `POST /api/embeddings` and single-shot generation via
//! `POST /api/generate` with streaming disabled.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::ProviderError;
use crate::providers::{validate_embedding, EmbeddingProvider, GenerativeModel};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default embedding model (768 dimensions)
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Request timeout (120 seconds, generation on CPU is slow)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama HTTP client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    embedding_model: String,
    dimension: usize,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL, DEFAULT_EMBEDDING_MODEL, 768)
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(
        base_url: &str,
        model: &str,
        embedding_model: &str,
        dimension: usize,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            embedding_model: embedding_model.to_string(),
            dimension,
        })
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ProviderError>
    where
        Req: Serialize + ?Sized,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status {
                service: "ollama".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Ollama {}: {}", path, e)))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).timeout(Duration::from_secs(2)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Get current generation model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get current embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response: EmbeddingResponse = self.post_json("/api/embeddings", &request).await?;
        validate_embedding(&response.embedding, self.dimension)?;

        debug!(model = %self.embedding_model, dim = response.embedding.len(), "ollama embedding");
        Ok(response.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl GenerativeModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response: GenerateResponse = self.post_json("/api/generate", &request).await?;
        let text = response.response.trim();
        if text.is_empty() {
            return Err(ProviderError::MalformedResponse(
                "Ollama returned an empty response".to_string(),
            ));
        }

        debug!(model = %self.model, chars = text.len(), "ollama generation");
        Ok(text.to_string())
    }
}

/// Ollama embeddings request
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Ollama embeddings response
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}
