// RAG (Retrieval-Augmented Generation) suggested-reply pipeline
//
// Components:
// - Retrieval: embed the email and fetch the nearest knowledge snippets
// - Context: assemble the grounded prompt
// - Generation: single-shot call to the generative model
// - Scoring: confidence from retrieval similarity
// - Pipeline: orchestration and failure policy

pub mod context;
pub mod generation;
pub mod pipeline;
pub mod retrieval;
pub mod scoring;
pub mod timeout;

// Re-export key types
pub use context::PromptBuilder;
pub use generation::ReplyGenerator;
pub use pipeline::{RAGConfig, RAGPipeline, RAGResult};
pub use retrieval::{ContextRetriever, RetrievedContext, DEFAULT_TOP_K};
pub use scoring::confidence_from_scores;
pub use timeout::StepTimeouts;
