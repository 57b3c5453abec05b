use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The index or embedding endpoint could not be reached. Callers treat
    /// this as a degraded-mode signal rather than a hard failure.
    #[error("Vector index unavailable: {0}")]
    Unavailable(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl From<qdrant_client::QdrantError> for VectorError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        let message = err.to_string();
        if is_transport_failure(&err, &message) {
            VectorError::Unavailable(message)
        } else {
            VectorError::Index(message)
        }
    }
}

/// Distinguish "the index is down" from "the index rejected the request".
///
/// qdrant-client surfaces transport problems as gRPC response errors with
/// the Unavailable / DeadlineExceeded status codes, which render into the
/// error display. Everything else (bad request, missing collection) stays a
/// plain index error.
fn is_transport_failure(err: &qdrant_client::QdrantError, message: &str) -> bool {
    matches!(err, qdrant_client::QdrantError::ResponseError { .. })
        && (message.contains("Unavailable")
            || message.contains("DeadlineExceeded")
            || message.contains("deadline has elapsed")
            || message.contains("tcp connect error")
            || message.contains("transport error"))
}

impl From<reqwest::Error> for VectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            VectorError::Unavailable(err.to_string())
        } else {
            VectorError::Embedding(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}
