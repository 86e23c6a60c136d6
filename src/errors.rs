//! Error types for ReplyBuddy
//!
//! Two layers: [`ProviderError`] describes what went wrong talking to an
//! external collaborator (embedding provider, vector index, generative
//! model), and [`RagError`] says which pipeline step it broke.

use thiserror::Error;

/// Failure reported by an external collaborator
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP transport errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from a provider
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },

    /// Response arrived but could not be used
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The requested vector collection does not exist
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Vector index temporarily unable to serve (unavailable, deadline, overload)
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// Any other vector index failure (auth, invalid argument, dimension mismatch)
    #[error("Vector index error: {0}")]
    Index(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Backend-specific failure (model loading, tokenization, ...)
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ProviderError {
    /// Whether the error carries the vector index "collection absent" signature
    pub fn is_collection_not_found(&self) -> bool {
        match self {
            ProviderError::CollectionNotFound(_) => true,
            ProviderError::Index(message) => has_not_found_signature(message),
            _ => false,
        }
    }

    /// Whether re-running the request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) => true,
            ProviderError::Timeout { .. } => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::IndexUnavailable(_) => true,

            ProviderError::Index(_) => false,
            ProviderError::MalformedResponse(_) => false,
            ProviderError::CollectionNotFound(_) => false,
            ProviderError::Backend(_) => false,
        }
    }
}

/// Matches the error text Qdrant produces for a missing collection
pub fn has_not_found_signature(message: &str) -> bool {
    message.contains("Not found") || message.contains("doesn't exist")
}

/// gRPC status codes worth another attempt
const UNAVAILABLE_CODES: &[&str] = &[
    "Unavailable",
    "DeadlineExceeded",
    "ResourceExhausted",
    "Aborted",
];

/// Matches Qdrant error text for failures that may clear up on their own
pub fn has_unavailable_signature(message: &str) -> bool {
    UNAVAILABLE_CODES
        .iter()
        .any(|code| message.contains(&format!("status: {}", code)))
        || message.contains("transport error")
        || message.contains("Timeout expired")
}

/// Main error type for the suggested-reply pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Embedding provider unreachable or returned an invalid vector
    #[error("Embedding failed: {0}")]
    Embedding(#[source] ProviderError),

    /// Vector index query failed for a reason other than a missing collection
    #[error("Failed to retrieve context from vector database: {0}")]
    ContextRetrieval(#[source] ProviderError),

    /// Vector index reachable but nothing to ground a reply on
    #[error("No relevant context found. Please ensure the knowledge base is seeded.")]
    EmptyKnowledgeBase,

    /// Generative model call failed
    #[error("Failed to generate reply: {0}")]
    ReplyGeneration(#[source] ProviderError),

    /// Caller passed arguments the pipeline cannot act on
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// The underlying provider failure, if this error wraps one
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            RagError::Embedding(e) | RagError::ContextRetrieval(e) | RagError::ReplyGeneration(e) => {
                Some(e)
            }
            RagError::EmptyKnowledgeBase | RagError::InvalidRequest(_) | RagError::Config(_) => None,
        }
    }

    /// Whether re-running the whole pipeline could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        self.provider_error().is_some_and(ProviderError::is_transient)
    }

    /// HTTP status a route handler should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            RagError::EmptyKnowledgeBase => 503,
            RagError::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// User-facing summary for the boundary layer
    pub fn user_message(&self) -> &'static str {
        match self {
            RagError::EmptyKnowledgeBase => {
                "Knowledge base not initialized. Please run the setup script first."
            }
            _ => "Failed to generate suggested reply",
        }
    }
}
