//! Vector Domain Library
//!
//! Embedding generation and vector index access for semantic search,
//! wrapping Qdrant behind a narrow trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   VectorIndex   │     │ EmbeddingProvider│
//! │     (trait)     │     │     (trait)      │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//! ┌────────▼────────┐     ┌────────▼─────────┐
//! │   QdrantIndex   │     │  OpenAIProvider  │
//! │ (implementation)│     │ (HTTP /embeddings)│
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! Index points carry the external record id, tenant label and source text
//! in their payload; the point id itself is assigned by this crate. Callers
//! address deletions by record id, never by point id.

pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod qdrant;

// Re-export commonly used types
pub use embedding::{EmbeddingProvider, OpenAIConfig, OpenAIProvider};
pub use error::{VectorError, VectorResult};
pub use index::VectorIndex;
pub use models::{
    DistanceMetric, EmbeddingModel, IndexConfig, SearchQuery, VectorHit, VectorRecord,
};
pub use qdrant::{QdrantConfig, QdrantIndex};
