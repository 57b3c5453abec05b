//! Semantic customer search
//!
//! Embeds the query, asks the vector index for nearest neighbours, then
//! joins the hits back to the store of record. The store of record wins:
//! hits whose backing record is gone are dropped, not surfaced.

use std::collections::HashMap;
use std::sync::Arc;

use domain_vector::{EmbeddingProvider, SearchQuery, VectorIndex};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::models::{CustomerRecord, SearchMatch};
use crate::repository::KnowledgeRepository;

/// Semantic search over a tenant's customer records
pub struct SemanticSearch<R: KnowledgeRepository> {
    repository: Arc<R>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    collection: String,
}

impl<R: KnowledgeRepository> SemanticSearch<R> {
    pub fn new(
        repository: Arc<R>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            embedder,
            index,
            collection: collection.into(),
        }
    }

    /// Find the customers closest in meaning to the query text
    ///
    /// Results come back in index rank order with similarity scores in
    /// (0, 1]. An empty index yields an empty result, not an error.
    #[instrument(skip(self, query))]
    pub async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        limit: u64,
    ) -> KnowledgeResult<Vec<SearchMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KnowledgeError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }

        let values = self.embedder.embed(query).await?;

        let hits = self
            .index
            .search(
                &self.collection,
                SearchQuery::new(values, limit).with_tenant(tenant_id),
            )
            .await?;

        if hits.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = hits.iter().map(|hit| hit.record_id).collect();
        let customers = self.repository.get_customers(ids).await?;

        let mut by_id: HashMap<Uuid, CustomerRecord> =
            customers.into_iter().map(|c| (c.id, c)).collect();

        // Join in rank order; hits without a backing record are stale index
        // entries and get dropped.
        let mut matches = Vec::with_capacity(hits.len());
        let mut stale = 0usize;
        for hit in hits {
            match by_id.remove(&hit.record_id) {
                Some(customer) => matches.push(SearchMatch {
                    similarity: hit.similarity(),
                    distance: hit.distance,
                    customer,
                }),
                None => stale += 1,
            }
        }

        if stale > 0 {
            debug!(stale, "Dropped index hits with no backing record");
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockKnowledgeRepository;
    use crate::test_support::{MockEmbedder, MockIndex, sample_customer};
    use domain_vector::VectorHit;

    const DIM: usize = 384;

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let search = SemanticSearch::new(
            Arc::new(MockKnowledgeRepository::new()),
            Arc::new(MockEmbedder::new()),
            Arc::new(MockIndex::new()),
            "knowledge_base",
        );

        let result = search.search("store-1", "   ", 5).await;
        assert!(matches!(result, Err(KnowledgeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_index_yields_empty_result() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1; DIM]));

        let mut index = MockIndex::new();
        index.expect_search().returning(|_, _| Ok(vec![]));

        let mut repository = MockKnowledgeRepository::new();
        repository.expect_get_customers().times(0);

        let search = SemanticSearch::new(
            Arc::new(repository),
            Arc::new(embedder),
            Arc::new(index),
            "knowledge_base",
        );

        let matches = search.search("store-1", "widgets", 5).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_search_scopes_to_tenant() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1; DIM]));

        let mut index = MockIndex::new();
        index
            .expect_search()
            .withf(|collection, query| {
                collection == "knowledge_base"
                    && query.tenant.as_deref() == Some("store-1")
                    && query.limit == 5
            })
            .returning(|_, _| Ok(vec![]));

        let search = SemanticSearch::new(
            Arc::new(MockKnowledgeRepository::new()),
            Arc::new(embedder),
            Arc::new(index),
            "knowledge_base",
        );

        search.search("store-1", "widgets", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_join_drops_stale_hits_and_keeps_rank_order() {
        let kept_a = sample_customer("store-1", "Closest", "a");
        let kept_b = sample_customer("store-1", "Further", "b");
        let stale_id = Uuid::now_v7();

        let hits = vec![
            VectorHit::new(kept_a.id, 0.2, None),
            VectorHit::new(stale_id, 0.5, None),
            VectorHit::new(kept_b.id, 1.0, None),
        ];

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1; DIM]));

        let mut index = MockIndex::new();
        index
            .expect_search()
            .returning(move |_, _| Ok(hits.clone()));

        let customers = vec![kept_b.clone(), kept_a.clone()];
        let mut repository = MockKnowledgeRepository::new();
        repository
            .expect_get_customers()
            .withf(move |ids| ids.len() == 3 && ids.contains(&stale_id))
            .returning(move |_| Ok(customers.clone()));

        let search = SemanticSearch::new(
            Arc::new(repository),
            Arc::new(embedder),
            Arc::new(index),
            "knowledge_base",
        );

        let matches = search.search("store-1", "widgets", 5).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].customer.name, "Closest");
        assert_eq!(matches[1].customer.name, "Further");
    }

    #[tokio::test]
    async fn test_similarity_derived_from_distance() {
        let customer = sample_customer("store-1", "Acme", "widgets");
        let hit = VectorHit::new(customer.id, 1.0, None);

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1; DIM]));

        let mut index = MockIndex::new();
        index
            .expect_search()
            .returning(move |_, _| Ok(vec![hit.clone()]));

        let mut repository = MockKnowledgeRepository::new();
        let found = vec![customer.clone()];
        repository
            .expect_get_customers()
            .returning(move |_| Ok(found.clone()));

        let search = SemanticSearch::new(
            Arc::new(repository),
            Arc::new(embedder),
            Arc::new(index),
            "knowledge_base",
        );

        let matches = search.search("store-1", "widgets", 1).await.unwrap();
        assert_eq!(matches[0].distance, 1.0);
        assert!((matches[0].similarity - 0.5).abs() < f32::EPSILON);
    }
}
