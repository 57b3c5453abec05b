//! Knowledge service - dual-write orchestration
//!
//! Coordinates the store of record (MongoDB), the vector index and the
//! cache. The store of record always wins: index and cache work happens
//! after the authoritative write and never rolls it back.

use std::sync::Arc;

use domain_vector::{EmbeddingProvider, IndexConfig, VectorError, VectorIndex, VectorRecord};
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::cache::{ResponseCache, chat_config_key};
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::ingest::normalize_question;
use crate::models::{
    CreateCustomer, CreateKnowledgePair, CustomerRecord, IndexOutcome, KnowledgePair,
    StoredCustomer, StoredPair, UpdateCustomer,
};
use crate::repository::KnowledgeRepository;

/// Knowledge service providing the write and read orchestration
pub struct KnowledgeService<R: KnowledgeRepository> {
    repository: Arc<R>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    cache: Arc<dyn ResponseCache>,
    collection: String,
}

impl<R: KnowledgeRepository> KnowledgeService<R> {
    /// Create a new KnowledgeService
    ///
    /// Fails fast when the embedding provider and the index disagree on
    /// vector dimension; every later insert would be rejected anyway.
    pub fn new(
        repository: R,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        cache: Arc<dyn ResponseCache>,
        index_config: &IndexConfig,
    ) -> KnowledgeResult<Self> {
        if embedder.dimension() != index_config.dimension {
            return Err(VectorError::Config(format!(
                "Embedding dimension {} does not match index dimension {}",
                embedder.dimension(),
                index_config.dimension
            ))
            .into());
        }

        Ok(Self {
            repository: Arc::new(repository),
            embedder,
            index,
            cache,
            collection: index_config.collection.clone(),
        })
    }

    /// Store a new customer: authoritative write first, then index
    #[instrument(skip(self, input), fields(store_id = %input.store_id))]
    pub async fn store_customer(&self, input: CreateCustomer) -> KnowledgeResult<StoredCustomer> {
        input
            .validate()
            .map_err(|e| KnowledgeError::Validation(e.to_string()))?;

        let customer = self.repository.insert_customer(input).await?;

        let outcome = self
            .index_text(customer.id, &customer.store_id, &customer.embedding_text())
            .await;

        Ok(StoredCustomer { customer, outcome })
    }

    /// Update a customer and refresh its index entry
    ///
    /// The index refresh is delete-then-insert so the record keeps at most
    /// one live entry.
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomer,
    ) -> KnowledgeResult<StoredCustomer> {
        input
            .validate()
            .map_err(|e| KnowledgeError::Validation(e.to_string()))?;

        let customer = self.repository.update_customer(id, input).await?;

        let outcome = match self.index.delete_by_record(&self.collection, id).await {
            Ok(()) => {
                self.index_text(customer.id, &customer.store_id, &customer.embedding_text())
                    .await
            }
            Err(err) => {
                warn!(customer_id = %id, error = %err, "Stale index entry not removed");
                IndexOutcome::skipped(err.to_string())
            }
        };

        Ok(StoredCustomer { customer, outcome })
    }

    /// Delete a customer, then best-effort remove its index entry
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> KnowledgeResult<()> {
        self.repository.delete_customer(id).await?;

        if let Err(err) = self.index.delete_by_record(&self.collection, id).await {
            // The search join drops hits without a backing record, so a
            // leftover point is harmless.
            warn!(customer_id = %id, error = %err, "Index entry not removed after delete");
        }

        Ok(())
    }

    /// Get a customer by id
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: Uuid) -> KnowledgeResult<CustomerRecord> {
        self.repository
            .get_customer(id)
            .await?
            .ok_or(KnowledgeError::NotFound(id))
    }

    /// Fetch customers by id set
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_customers(&self, ids: Vec<Uuid>) -> KnowledgeResult<Vec<CustomerRecord>> {
        self.repository.get_customers(ids).await
    }

    /// Add a single Q&A pair to a tenant's chat config
    ///
    /// Invalidates the tenant's cached config and bumps the knowledge
    /// version so cached chat responses stop matching.
    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id))]
    pub async fn add_chat_pair(&self, input: CreateKnowledgePair) -> KnowledgeResult<StoredPair> {
        input
            .validate()
            .map_err(|e| KnowledgeError::Validation(e.to_string()))?;

        let question = normalize_question(&input.question);
        if question.is_empty() {
            return Err(KnowledgeError::Validation(
                "Question has no content after normalization".to_string(),
            ));
        }
        let input = CreateKnowledgePair { question, ..input };

        let pair = self.repository.insert_pair(input).await?;

        let outcome = self
            .index_text(pair.id, &pair.tenant_id, &pair.embedding_text())
            .await;

        self.invalidate_chat_caches(&pair.tenant_id).await;

        Ok(StoredPair { pair, outcome })
    }

    /// Remove a Q&A pair from a tenant's chat config
    ///
    /// Store-of-record delete first, then best-effort index delete, then
    /// the same cache invalidation as the write path.
    #[instrument(skip(self))]
    pub async fn remove_chat_pair(&self, id: Uuid) -> KnowledgeResult<()> {
        let pair = self
            .repository
            .find_pairs_by_ids(vec![id])
            .await?
            .into_iter()
            .next()
            .ok_or(KnowledgeError::NotFound(id))?;

        self.repository.delete_pair(id).await?;

        if let Err(err) = self.index.delete_by_record(&self.collection, id).await {
            warn!(pair_id = %id, error = %err, "Index entry not removed after pair delete");
        }

        self.invalidate_chat_caches(&pair.tenant_id).await;

        Ok(())
    }

    /// Cache-aside read of a tenant's chat config
    #[instrument(skip(self))]
    pub async fn get_chat_config(&self, tenant_id: &str) -> KnowledgeResult<Vec<KnowledgePair>> {
        load_chat_config(&*self.repository, &*self.cache, tenant_id).await
    }

    /// Embed and index a piece of text under the given record id
    async fn index_text(&self, record_id: Uuid, tenant: &str, text: &str) -> IndexOutcome {
        match self.try_index(record_id, tenant, text).await {
            Ok(()) => IndexOutcome::Indexed,
            Err(err) => {
                warn!(%record_id, error = %err, "Index write skipped; record remains authoritative");
                IndexOutcome::skipped(err.to_string())
            }
        }
    }

    async fn try_index(&self, record_id: Uuid, tenant: &str, text: &str) -> KnowledgeResult<()> {
        let values = self.embedder.embed(text).await?;
        let record = VectorRecord::new(record_id, tenant, text, values);
        self.index.insert(&self.collection, record).await?;
        Ok(())
    }

    /// Drop the tenant's config cache and bump its knowledge version.
    /// Failures are logged only; the cache rebuilds on the next read.
    async fn invalidate_chat_caches(&self, tenant_id: &str) {
        if let Err(err) = self.cache.delete(&chat_config_key(tenant_id)).await {
            warn!(tenant_id, error = %err, "Chat config cache not invalidated");
        }
        if let Err(err) = self.cache.bump_knowledge_version(tenant_id).await {
            warn!(tenant_id, error = %err, "Knowledge version not bumped");
        }
    }
}

impl<R: KnowledgeRepository> Clone for KnowledgeService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            embedder: Arc::clone(&self.embedder),
            index: Arc::clone(&self.index),
            cache: Arc::clone(&self.cache),
            collection: self.collection.clone(),
        }
    }
}

/// Cache-aside read of a tenant's pair list, shared with the chat engine
pub(crate) async fn load_chat_config(
    repository: &dyn KnowledgeRepository,
    cache: &dyn ResponseCache,
    tenant_id: &str,
) -> KnowledgeResult<Vec<KnowledgePair>> {
    let key = chat_config_key(tenant_id);

    match cache.get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(pairs) => return Ok(pairs),
            Err(err) => {
                warn!(tenant_id, error = %err, "Discarding unparseable cached chat config");
            }
        },
        Ok(None) => {}
        Err(err) => {
            warn!(tenant_id, error = %err, "Chat config cache read failed; using store of record");
        }
    }

    let pairs = repository.list_pairs_by_tenant(tenant_id).await?;

    match serde_json::to_string(&pairs) {
        Ok(raw) => {
            if let Err(err) = cache.set(&key, &raw, None).await {
                warn!(tenant_id, error = %err, "Chat config cache write failed");
            }
        }
        Err(err) => {
            warn!(tenant_id, error = %err, "Chat config not serializable for caching");
        }
    }

    Ok(pairs)
}
