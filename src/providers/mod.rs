//! External collaborators of the suggested-reply pipeline
//!
//! The pipeline only ever talks to these three traits. Concrete clients:
//! - Ollama: embeddings + generation against a local Ollama server
//! - Gemini: embeddings + generation against the Google Generative Language API
//! - Local (feature `local-embeddings`): in-process nomic-embed-text via candle
//!
//! The Qdrant-backed [`VectorIndex`] lives in [`crate::vector_db`].

pub mod gemini;
pub mod ollama;

#[cfg(feature = "local-embeddings")]
pub mod local;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::errors::ProviderError;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedder;

/// Turns text into a fixed-size vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;
}

/// Read-only nearest-neighbor search over stored (vector, payload) points
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `limit` hits ordered by descending similarity, payload included
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Single-shot text generation
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// One nearest-neighbor hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f32,
    pub payload: HashMap<String, JsonValue>,
}

impl SearchHit {
    /// String payload field, if present and a string
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(JsonValue::as_str)
    }
}

/// Reject vectors the index could not meaningfully compare
pub fn validate_embedding(embedding: &[f32], expected_dim: usize) -> Result<(), ProviderError> {
    if embedding.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "embedding vector is empty".to_string(),
        ));
    }

    if embedding.len() != expected_dim {
        return Err(ProviderError::MalformedResponse(format!(
            "embedding has {} dimensions, expected {}",
            embedding.len(),
            expected_dim
        )));
    }

    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(ProviderError::MalformedResponse(
            "embedding contains non-finite values".to_string(),
        ));
    }

    Ok(())
}
