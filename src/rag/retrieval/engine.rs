// Context retrieval: embed the query, then nearest-neighbor search
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::{RagError, Result};
use crate::providers::{EmbeddingProvider, SearchHit, VectorIndex};
use crate::rag::timeout::{with_timeout, StepTimeouts};
use crate::vector_db::DEFAULT_COLLECTION;

/// Default number of snippets to retrieve
pub const DEFAULT_TOP_K: usize = 3;

/// Category reported for snippets stored without one
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A knowledge snippet plus its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub text: String,
    pub category: String,
    pub score: f32,
}

impl From<SearchHit> for RetrievedContext {
    fn from(hit: SearchHit) -> Self {
        Self {
            text: hit.payload_str("text").unwrap_or_default().to_string(),
            category: hit
                .payload_str("category")
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_string(),
            score: hit.score,
        }
    }
}

/// Fetches the most relevant knowledge snippets for a piece of text
pub struct ContextRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    timeouts: StepTimeouts,
}

impl ContextRetriever {
    /// Create retriever over the default knowledge collection
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            collection: DEFAULT_COLLECTION.to_string(),
            timeouts: StepTimeouts::default(),
        }
    }

    /// Search a different collection
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Apply embed/search deadlines
    pub fn with_timeouts(mut self, timeouts: StepTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Retrieve at most `top_k` snippets, ordered by descending score.
    ///
    /// A missing collection yields an empty vector rather than an error: the
    /// knowledge base simply has not been seeded yet. Every other index
    /// failure is a [`RagError::ContextRetrieval`].
    pub async fn retrieve_context(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedContext>> {
        if top_k == 0 {
            return Err(RagError::InvalidRequest("top_k must be at least 1".to_string()));
        }
        if query.trim().is_empty() {
            return Err(RagError::InvalidRequest("query text is empty".to_string()));
        }

        debug!("Generating query embedding");
        let embedding = with_timeout(self.timeouts.embed, self.embedder.embed(query))
            .await
            .map_err(RagError::Embedding)?;

        debug!(collection = %self.collection, top_k, "Searching vector database");
        let search = self.index.search(&self.collection, &embedding, top_k);
        let hits = match with_timeout(self.timeouts.search, search).await {
            Ok(hits) => hits,
            Err(e) if e.is_collection_not_found() => {
                warn!(
                    collection = %self.collection,
                    "Knowledge base collection not found. Please seed it first."
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(RagError::ContextRetrieval(e)),
        };

        let context: Vec<RetrievedContext> = hits
            .into_iter()
            .take(top_k)
            .map(RetrievedContext::from)
            .collect();

        debug!(count = context.len(), "Retrieved relevant context chunks");
        Ok(context)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}
