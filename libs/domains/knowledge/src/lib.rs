//! Knowledge Domain Library
//!
//! Multi-tenant knowledge backend for a chat assistant: customer records
//! and Q&A pairs live in MongoDB (the store of record), semantic search
//! runs against a vector index, and Redis caches chat configs and
//! responses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   ┌───────────────┐   ┌────────────────┐
//! │ KnowledgeService │   │ SemanticSearch│   │   ChatEngine   │
//! │  (dual writes)   │   │ (embed+join)  │   │ (cache-aside)  │
//! └───────┬──────────┘   └──────┬────────┘   └───────┬────────┘
//!         │                     │                    │
//!   ┌─────▼─────────────────────▼────────────────────▼─────┐
//!   │ KnowledgeRepository (MongoDB) · VectorIndex (Qdrant) │
//!   │ EmbeddingProvider · ResponseCache (Redis)            │
//!   └──────────────────────────────────────────────────────┘
//! ```
//!
//! The store of record is authoritative. Index entries and cache keys are
//! derived data: losing them degrades search and costs recomputation, but
//! never loses knowledge.

pub mod cache;
pub mod chat;
pub mod error;
pub mod ingest;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod search;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use cache::{RedisResponseCache, ResponseCache};
pub use chat::{ChatEngine, CompletionClient, OllamaClient, OllamaConfig};
pub use error::{KnowledgeError, KnowledgeResult};
pub use ingest::{IngestionEngine, normalize_question};
pub use models::{
    CallerIdentity, CreateCustomer, CreateKnowledgePair, CustomerRecord, IndexOutcome,
    IngestReport, KnowledgePair, SearchMatch, StoredCustomer, StoredPair, TenantProfile,
    UpdateCustomer,
};
pub use mongodb::MongoKnowledgeRepository;
pub use repository::KnowledgeRepository;
pub use search::SemanticSearch;
pub use service::KnowledgeService;
