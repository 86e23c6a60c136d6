// End-to-end suggested-reply pipeline: retrieve -> generate -> score
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{RagError, Result};
use crate::providers::{EmbeddingProvider, GenerativeModel, VectorIndex};
use crate::rag::generation::ReplyGenerator;
use crate::rag::retrieval::{ContextRetriever, RetrievedContext, DEFAULT_TOP_K};
use crate::rag::scoring;
use crate::rag::timeout::StepTimeouts;
use crate::retry::RetryPolicy;
use crate::vector_db::DEFAULT_COLLECTION;

/// RAG pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RAGConfig {
    /// Knowledge collection to search
    pub collection: String,
    /// Number of snippets to ground the reply on
    pub top_k: usize,
    /// Per-step deadlines
    pub timeouts: StepTimeouts,
    /// Whole-pipeline retry for transient failures
    pub retry: RetryPolicy,
}

impl Default for RAGConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            top_k: DEFAULT_TOP_K,
            timeouts: StepTimeouts::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// RAG pipeline result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RAGResult {
    /// Draft reply text
    pub suggested_reply: String,
    /// Grounding snippets, descending by score
    pub retrieved_context: Vec<RetrievedContext>,
    /// Mean retrieval score as a percentage
    pub confidence: u8,
}

/// End-to-end suggested-reply pipeline
pub struct RAGPipeline {
    retriever: ContextRetriever,
    generator: ReplyGenerator,
    config: RAGConfig,
}

impl RAGPipeline {
    /// Create pipeline with default configuration
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self::with_config(embedder, index, model, RAGConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn GenerativeModel>,
        config: RAGConfig,
    ) -> Self {
        let retriever = ContextRetriever::new(embedder, index)
            .with_collection(config.collection.clone())
            .with_timeouts(config.timeouts);
        let generator = ReplyGenerator::new(model).with_timeout(config.timeouts.generate);

        Self {
            retriever,
            generator,
            config,
        }
    }

    /// Retrieve context, draft a grounded reply and score it.
    ///
    /// Refuses to generate when no context is available: an ungrounded reply
    /// is never returned as a success.
    pub async fn generate_suggested_reply(&self, email_text: &str) -> Result<RAGResult> {
        info!("Starting RAG pipeline");

        let result = self
            .config
            .retry
            .execute(move || self.run_once(email_text))
            .await;

        match &result {
            Ok(r) => info!(
                confidence = r.confidence,
                snippets = r.retrieved_context.len(),
                "RAG pipeline complete"
            ),
            Err(e) => warn!(error = %e, "RAG pipeline failed"),
        }

        result
    }

    async fn run_once(&self, email_text: &str) -> Result<RAGResult> {
        let retrieved_context = self
            .retriever
            .retrieve_context(email_text, self.config.top_k)
            .await?;

        let confidence = match scoring::confidence(&retrieved_context) {
            Some(confidence) => confidence,
            None => {
                warn!("No relevant context found in knowledge base");
                return Err(RagError::EmptyKnowledgeBase);
            }
        };

        let suggested_reply = self
            .generator
            .generate_reply(email_text, &retrieved_context)
            .await?;

        debug!(reply_chars = suggested_reply.len(), "Reply generated");

        Ok(RAGResult {
            suggested_reply,
            retrieved_context,
            confidence,
        })
    }

    /// Retrieval step only
    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    /// Get current configuration
    pub fn config(&self) -> &RAGConfig {
        &self.config
    }
}
