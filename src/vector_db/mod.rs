// Vector database access - Qdrant
pub mod qdrant;

pub use qdrant::{QdrantIndex, DEFAULT_COLLECTION, DEFAULT_QDRANT_URL};
