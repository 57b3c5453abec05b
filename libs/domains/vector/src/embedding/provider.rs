use async_trait::async_trait;

use crate::error::VectorResult;

/// Trait for embedding generation providers
///
/// Implementations call out to an embedding model (hosted API or a local
/// inference server). All returned vectors have exactly `dimension()`
/// components, and batch results preserve input order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimension of the vectors this provider produces
    fn dimension(&self) -> u32;

    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;

    /// Generate embeddings for multiple texts in one request
    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>>;
}
