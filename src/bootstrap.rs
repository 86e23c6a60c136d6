//! Wiring: turn a [`Config`] into concrete collaborators and a pipeline

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{Backend, Config};
use crate::providers::{EmbeddingProvider, GeminiClient, GenerativeModel, OllamaClient};
use crate::rag::RAGPipeline;
use crate::vector_db::QdrantIndex;

fn gemini_client(config: &Config, model: &str, embedding_model: &str) -> Result<GeminiClient> {
    let api_key = config
        .gemini
        .api_key
        .clone()
        .context("GEMINI_API_KEY is not set")?;

    GeminiClient::with_config(
        &config.gemini.base_url,
        api_key,
        model,
        embedding_model,
        config.embedding.dimension,
    )
    .context("Failed to create Gemini client")
}

fn ollama_client(config: &Config) -> Result<OllamaClient> {
    OllamaClient::with_config(
        &config.ollama_url(),
        config.generation_model(),
        config.embedding_model(),
        config.embedding.dimension,
    )
    .context("Failed to create Ollama client")
}

/// Embedding provider for the configured backend
pub fn build_embedder(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    debug!(backend = %config.embedding.backend, model = config.embedding_model(), "embedding provider");

    match config.embedding.backend {
        Backend::Ollama => Ok(Arc::new(ollama_client(config)?)),
        Backend::Gemini => Ok(Arc::new(gemini_client(
            config,
            config.generation_model(),
            config.embedding_model(),
        )?)),
        Backend::Local => build_local_embedder(config),
    }
}

#[cfg(feature = "local-embeddings")]
fn build_local_embedder(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder = crate::providers::LocalEmbedder::new(
        config.embedding_model(),
        config.embedding.dimension,
    )
    .context("Failed to load local embedding model")?;
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "local-embeddings"))]
fn build_local_embedder(_config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    anyhow::bail!("the local embedding backend requires the `local-embeddings` feature")
}

/// Generative model for the configured backend
pub fn build_generator(config: &Config) -> Result<Arc<dyn GenerativeModel>> {
    debug!(backend = %config.generation.backend, model = config.generation_model(), "generative model");

    match config.generation.backend {
        Backend::Ollama => Ok(Arc::new(ollama_client(config)?)),
        Backend::Gemini => Ok(Arc::new(gemini_client(
            config,
            config.generation_model(),
            config.embedding_model(),
        )?)),
        Backend::Local => anyhow::bail!("the local backend only supports embeddings"),
    }
}

/// Qdrant index from configuration
pub fn build_index(config: &Config) -> Result<Arc<QdrantIndex>> {
    let index = QdrantIndex::new(
        &config.qdrant.url,
        config.qdrant.api_key.clone(),
        Duration::from_secs(config.qdrant.timeout_secs),
    )
    .context("Failed to create Qdrant client")?;

    Ok(Arc::new(index))
}

/// Fully wired suggested-reply pipeline
pub fn build_pipeline(config: &Config) -> Result<RAGPipeline> {
    let embedder = build_embedder(config)?;
    let index = build_index(config)?;
    let model = build_generator(config)?;

    Ok(RAGPipeline::with_config(embedder, index, model, config.rag_config()))
}
