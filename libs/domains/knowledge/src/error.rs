use domain_vector::VectorError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    /// The vector index could not be reached. Authoritative writes still
    /// succeed while this holds; only indexing and search degrade.
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The LLM produced output that does not parse as a Q&A array.
    /// Carries a bounded preview of the raw output for diagnosis.
    #[error("Could not parse generated pairs: {preview}")]
    GenerationParse { preview: String },

    #[error("Generation produced no usable pairs")]
    EmptyGeneration,

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

impl From<mongodb::error::Error> for KnowledgeError {
    fn from(err: mongodb::error::Error) -> Self {
        KnowledgeError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for KnowledgeError {
    fn from(err: redis::RedisError) -> Self {
        KnowledgeError::Internal(format!("Redis error: {}", err))
    }
}

impl From<VectorError> for KnowledgeError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::Validation(msg) => KnowledgeError::Validation(msg),
            VectorError::Unavailable(msg) => KnowledgeError::IndexUnavailable(msg),
            VectorError::Embedding(msg) => KnowledgeError::Embedding(msg),
            VectorError::Index(msg) => KnowledgeError::Internal(format!("Index error: {}", msg)),
            VectorError::Config(msg) => KnowledgeError::Internal(format!("Config error: {}", msg)),
            VectorError::Internal(msg) => KnowledgeError::Internal(msg),
        }
    }
}
