use async_trait::async_trait;
use uuid::Uuid;

use crate::error::KnowledgeResult;
use crate::models::{
    CreateCustomer, CreateKnowledgePair, CustomerRecord, KnowledgePair, TenantProfile,
    UpdateCustomer,
};

/// Repository trait for the store of record
///
/// The store of record is authoritative: every knowledge mutation lands
/// here first, before any index or cache work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    // ===== Knowledge pairs =====

    /// Insert a single knowledge pair
    async fn insert_pair(&self, input: CreateKnowledgePair) -> KnowledgeResult<KnowledgePair>;

    /// Insert multiple knowledge pairs in one write
    async fn insert_pairs(
        &self,
        inputs: Vec<CreateKnowledgePair>,
    ) -> KnowledgeResult<Vec<KnowledgePair>>;

    /// List all pairs belonging to a tenant, oldest first
    async fn list_pairs_by_tenant(&self, tenant_id: &str) -> KnowledgeResult<Vec<KnowledgePair>>;

    /// Fetch pairs by id set; missing ids are silently absent from the result
    async fn find_pairs_by_ids(&self, ids: Vec<Uuid>) -> KnowledgeResult<Vec<KnowledgePair>>;

    /// Delete a pair by id
    async fn delete_pair(&self, id: Uuid) -> KnowledgeResult<bool>;

    // ===== Customers =====

    /// Insert a new customer
    async fn insert_customer(&self, input: CreateCustomer) -> KnowledgeResult<CustomerRecord>;

    /// Get a customer by id
    async fn get_customer(&self, id: Uuid) -> KnowledgeResult<Option<CustomerRecord>>;

    /// Fetch customers by id set; missing ids are silently absent
    async fn get_customers(&self, ids: Vec<Uuid>) -> KnowledgeResult<Vec<CustomerRecord>>;

    /// Update an existing customer
    async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomer,
    ) -> KnowledgeResult<CustomerRecord>;

    /// Delete a customer by id
    async fn delete_customer(&self, id: Uuid) -> KnowledgeResult<bool>;

    // ===== Tenants =====

    /// Look up a tenant's profile by store id
    async fn get_tenant_profile(&self, tenant_id: &str) -> KnowledgeResult<Option<TenantProfile>>;
}
