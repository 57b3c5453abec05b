use async_trait::async_trait;
use uuid::Uuid;

use crate::error::VectorResult;
use crate::models::{IndexConfig, SearchQuery, VectorHit, VectorRecord};

/// Trait for vector index operations
///
/// Abstracts the underlying vector database (Qdrant). Points are addressed
/// externally by their `record_id` payload field, not by point id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if it does not exist yet.
    ///
    /// Safe to call concurrently: the loser of a create race observes the
    /// collection created by the winner and returns success.
    async fn ensure_collection(&self, config: &IndexConfig) -> VectorResult<()>;

    /// Insert a single point, returning its index-assigned point id
    async fn insert(&self, collection: &str, record: VectorRecord) -> VectorResult<Uuid>;

    /// Insert multiple points in one call, returning point ids in input order
    async fn insert_batch(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> VectorResult<Vec<Uuid>>;

    /// Delete all points whose payload references the given record id.
    ///
    /// Idempotent: deleting a record with no points succeeds.
    async fn delete_by_record(&self, collection: &str, record_id: Uuid) -> VectorResult<()>;

    /// Search for the nearest points, closest first
    async fn search(&self, collection: &str, query: SearchQuery) -> VectorResult<Vec<VectorHit>>;
}
