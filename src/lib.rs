//! ReplyBuddy - grounded suggested replies for inbound email
//!
//! Retrieves product-knowledge snippets from a vector index, asks a
//! generative model for a reply grounded in them, and scores the result.
//!
//! # Architecture
//!
//! - **providers**: embedding and generation clients behind narrow traits
//! - **vector_db**: Qdrant-backed nearest-neighbor search
//! - **rag**: retrieval, prompt assembly, generation, confidence
//! - **email**: boundary formatting for stored emails and responses

pub mod errors;
pub mod providers;
pub mod vector_db;
pub mod rag;
pub mod retry;
pub mod email;

// Re-export commonly used types
pub use errors::{ProviderError, RagError, Result};
pub use rag::{RAGPipeline, RAGResult, RetrievedContext};

// Application layer
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod logging;
