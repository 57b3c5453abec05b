//! MongoDB implementation of KnowledgeRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Bson, doc, to_bson},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::models::{
    CreateCustomer, CreateKnowledgePair, CustomerRecord, KnowledgePair, TenantProfile,
    UpdateCustomer,
};
use crate::repository::KnowledgeRepository;

/// MongoDB implementation of the KnowledgeRepository
pub struct MongoKnowledgeRepository {
    pairs: Collection<KnowledgePair>,
    customers: Collection<CustomerRecord>,
    tenants: Collection<TenantProfile>,
}

impl MongoKnowledgeRepository {
    /// Create a new MongoKnowledgeRepository
    ///
    /// # Example
    /// ```ignore
    /// let client = database::mongodb::connect("mongodb://localhost:27017").await?;
    /// let repo = MongoKnowledgeRepository::new(client.database("chat_bot"));
    /// ```
    pub fn new(db: Database) -> Self {
        Self {
            pairs: db.collection::<KnowledgePair>("knowledge_pairs"),
            customers: db.collection::<CustomerRecord>("customers"),
            tenants: db.collection::<TenantProfile>("tenants"),
        }
    }

    fn id_filter(id: Uuid) -> mongodb::bson::Document {
        doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) }
    }

    fn ids_filter(ids: &[Uuid]) -> mongodb::bson::Document {
        doc! { "_id": { "$in": to_bson(ids).unwrap_or(Bson::Null) } }
    }
}

#[async_trait]
impl KnowledgeRepository for MongoKnowledgeRepository {
    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id))]
    async fn insert_pair(&self, input: CreateKnowledgePair) -> KnowledgeResult<KnowledgePair> {
        let pair = KnowledgePair::new(input);
        self.pairs.insert_one(&pair).await?;

        tracing::info!(pair_id = %pair.id, "Knowledge pair created");
        Ok(pair)
    }

    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    async fn insert_pairs(
        &self,
        inputs: Vec<CreateKnowledgePair>,
    ) -> KnowledgeResult<Vec<KnowledgePair>> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }

        let pairs: Vec<KnowledgePair> = inputs.into_iter().map(KnowledgePair::new).collect();
        self.pairs.insert_many(&pairs).await?;

        tracing::info!(count = pairs.len(), "Knowledge pairs created");
        Ok(pairs)
    }

    #[instrument(skip(self))]
    async fn list_pairs_by_tenant(&self, tenant_id: &str) -> KnowledgeResult<Vec<KnowledgePair>> {
        let cursor = self
            .pairs
            .find(doc! { "tenant_id": tenant_id })
            .sort(doc! { "created_at": 1 })
            .await?;
        let pairs: Vec<KnowledgePair> = cursor.try_collect().await?;
        Ok(pairs)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_pairs_by_ids(&self, ids: Vec<Uuid>) -> KnowledgeResult<Vec<KnowledgePair>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let cursor = self.pairs.find(Self::ids_filter(&ids)).await?;
        let pairs: Vec<KnowledgePair> = cursor.try_collect().await?;
        Ok(pairs)
    }

    #[instrument(skip(self))]
    async fn delete_pair(&self, id: Uuid) -> KnowledgeResult<bool> {
        let result = self.pairs.delete_one(Self::id_filter(id)).await?;

        if result.deleted_count == 0 {
            return Err(KnowledgeError::NotFound(id));
        }

        tracing::info!(pair_id = %id, "Knowledge pair deleted");
        Ok(true)
    }

    #[instrument(skip(self, input), fields(store_id = %input.store_id))]
    async fn insert_customer(&self, input: CreateCustomer) -> KnowledgeResult<CustomerRecord> {
        let customer = CustomerRecord::new(input);
        self.customers.insert_one(&customer).await?;

        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    #[instrument(skip(self))]
    async fn get_customer(&self, id: Uuid) -> KnowledgeResult<Option<CustomerRecord>> {
        let customer = self.customers.find_one(Self::id_filter(id)).await?;
        Ok(customer)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_customers(&self, ids: Vec<Uuid>) -> KnowledgeResult<Vec<CustomerRecord>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let cursor = self.customers.find(Self::ids_filter(&ids)).await?;
        let customers: Vec<CustomerRecord> = cursor.try_collect().await?;
        Ok(customers)
    }

    #[instrument(skip(self, input))]
    async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomer,
    ) -> KnowledgeResult<CustomerRecord> {
        let filter = Self::id_filter(id);
        let existing = self
            .customers
            .find_one(filter.clone())
            .await?
            .ok_or(KnowledgeError::NotFound(id))?;

        let mut updated = existing;
        updated.apply_update(input);

        self.customers.replace_one(filter, &updated).await?;

        tracing::info!(customer_id = %id, "Customer updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_customer(&self, id: Uuid) -> KnowledgeResult<bool> {
        let result = self.customers.delete_one(Self::id_filter(id)).await?;

        if result.deleted_count == 0 {
            return Err(KnowledgeError::NotFound(id));
        }

        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn get_tenant_profile(&self, tenant_id: &str) -> KnowledgeResult<Option<TenantProfile>> {
        let profile = self.tenants.find_one(doc! { "store_id": tenant_id }).await?;
        Ok(profile)
    }
}
