//! In-process embeddings via candle (feature `local-embeddings`)
//!
//! Downloads the model from the HuggingFace Hub on first use and mean-pools
//! the last hidden state. Inference runs on the blocking thread pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::info;

use crate::errors::ProviderError;
use crate::providers::{validate_embedding, EmbeddingProvider};

pub const DEFAULT_MODEL_ID: &str = "nomic-ai/nomic-embed-text-v1.5";

struct Inner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Embedding provider backed by a local BERT-family model
#[derive(Clone)]
pub struct LocalEmbedder {
    inner: Arc<Inner>,
    dimension: usize,
}

impl LocalEmbedder {
    /// Load `model_id` from the hub (cached after the first download)
    pub fn new(model_id: &str, dimension: usize) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json").context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // SAFETY: the safetensors file is owned by the hub cache and not mutated while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let model = BertModel::load(vb, &config).context("Failed to create BERT model")?;

        info!(model = model_id, "local embedding model loaded");

        Ok(Self {
            inner: Arc::new(Inner {
                model,
                tokenizer,
                device,
            }),
            dimension,
        })
    }

    fn embed_blocking(inner: &Inner, text: &str) -> Result<Vec<f32>> {
        let encoding = inner
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids = encoding.get_ids().to_vec();
        let mask = encoding.get_attention_mask().to_vec();
        let len = ids.len();

        let token_ids = Tensor::from_vec(ids, (1, len), &inner.device)?;
        let attention_mask = Tensor::from_vec(mask, (1, len), &inner.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = inner
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;

        let mut rows = pooled.to_vec2::<f32>()?;
        rows.pop().context("Model produced no embedding rows")
    }
}

/// Mean pooling with attention mask
fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask_expanded = attention_mask
        .unsqueeze(2)?
        .expand(embeddings.shape())?
        .to_dtype(embeddings.dtype())?;

    let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
    let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

    Ok(sum_embeddings.broadcast_div(&sum_mask)?)
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();

        let embedding = tokio::task::spawn_blocking(move || Self::embed_blocking(&inner, &text))
            .await
            .map_err(|e| ProviderError::Backend(format!("embedding task failed: {}", e)))?
            .map_err(|e| ProviderError::Backend(format!("{:#}", e)))?;

        validate_embedding(&embedding, self.dimension)?;
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
