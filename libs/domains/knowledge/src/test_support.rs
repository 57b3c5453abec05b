//! Shared mocks and fixtures for unit tests

use async_trait::async_trait;
use chrono::Utc;
use domain_vector::{
    EmbeddingProvider, IndexConfig, SearchQuery, VectorHit, VectorIndex, VectorRecord,
    VectorResult,
};
use uuid::Uuid;

use crate::models::{CustomerRecord, KnowledgePair};

mockall::mock! {
    pub Index {}

    #[async_trait]
    impl VectorIndex for Index {
        async fn ensure_collection(&self, config: &IndexConfig) -> VectorResult<()>;
        async fn insert(&self, collection: &str, record: VectorRecord) -> VectorResult<Uuid>;
        async fn insert_batch(
            &self,
            collection: &str,
            records: Vec<VectorRecord>,
        ) -> VectorResult<Vec<Uuid>>;
        async fn delete_by_record(&self, collection: &str, record_id: Uuid) -> VectorResult<()>;
        async fn search(
            &self,
            collection: &str,
            query: SearchQuery,
        ) -> VectorResult<Vec<VectorHit>>;
    }
}

mockall::mock! {
    pub Embedder {}

    #[async_trait]
    impl EmbeddingProvider for Embedder {
        fn dimension(&self) -> u32;
        async fn embed(&self, text: &str) -> VectorResult<Vec<f32>>;
        async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>>;
    }
}

pub fn sample_customer(store_id: &str, name: &str, description: &str) -> CustomerRecord {
    let now = Utc::now();
    CustomerRecord {
        id: Uuid::now_v7(),
        store_id: store_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_pair(tenant_id: &str, question: &str, answer: &str) -> KnowledgePair {
    KnowledgePair {
        id: Uuid::now_v7(),
        tenant_id: tenant_id.to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        created_at: Utc::now(),
    }
}
