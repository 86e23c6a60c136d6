// Context retrieval module
pub mod engine;

pub use engine::{ContextRetriever, RetrievedContext, DEFAULT_TOP_K, UNKNOWN_CATEGORY};
