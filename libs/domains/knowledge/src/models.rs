use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A question/answer pair in a tenant's knowledge base
///
/// Questions are stored normalized (collapsed whitespace, single trailing
/// question mark); normalization happens on the write paths, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgePair {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Owning tenant (store identifier)
    pub tenant_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl KnowledgePair {
    pub fn new(input: CreateKnowledgePair) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id: input.tenant_id,
            question: input.question,
            answer: input.answer,
            created_at: Utc::now(),
        }
    }

    /// Text fed to the embedding model when indexing this pair
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.question, self.answer)
    }
}

/// DTO for creating a knowledge pair
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateKnowledgePair {
    #[validate(length(min = 1))]
    pub tenant_id: String,
    #[validate(length(min = 1))]
    pub question: String,
    #[validate(length(min = 1))]
    pub answer: String,
}

/// Customer entity - the authoritative record behind semantic search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Owning tenant (store identifier)
    pub store_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerRecord {
    pub fn new(input: CreateCustomer) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            store_id: input.store_id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply updates from UpdateCustomer DTO
    pub fn apply_update(&mut self, update: UpdateCustomer) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        self.updated_at = Utc::now();
    }

    /// Text fed to the embedding model when indexing this customer
    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

/// DTO for creating a customer
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomer {
    #[validate(length(min = 1))]
    pub store_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// DTO for updating a customer
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Tenant profile backing the chat grounding prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Store identifier used as the tenant key
    pub store_id: String,
    pub company_name: String,
    pub description: Option<String>,
    pub website: Option<String>,
}

/// Already-validated caller identity handed to the chat engine
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// The caller's API key, used to scope response caching
    pub api_key: String,
    /// Tenant (store) this caller belongs to
    pub tenant_id: String,
}

impl CallerIdentity {
    pub fn new(api_key: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

/// Whether a record made it into the vector index
///
/// The authoritative write never rolls back on index failure, so callers
/// see a stored record plus this outcome rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed,
    Skipped { reason: String },
}

impl IndexOutcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, IndexOutcome::Indexed)
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        IndexOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

/// A stored customer together with its index outcome
#[derive(Debug, Clone)]
pub struct StoredCustomer {
    pub customer: CustomerRecord,
    pub outcome: IndexOutcome,
}

/// A stored knowledge pair together with its index outcome
#[derive(Debug, Clone)]
pub struct StoredPair {
    pub pair: KnowledgePair,
    pub outcome: IndexOutcome,
}

/// A semantic search result joined back to its authoritative record
#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub customer: CustomerRecord,
    /// Raw index distance (lower is closer)
    pub distance: f32,
    /// Similarity score in (0, 1], derived as 1 / (1 + distance)
    pub similarity: f32,
}

/// Summary of an ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub tenant_id: String,
    /// Number of pairs written to the store of record
    pub inserted: usize,
    /// Ids of the inserted pairs, in insertion order
    pub ids: Vec<Uuid>,
    /// First few inserted pairs, for display
    pub preview: Vec<KnowledgePair>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_ids_are_time_ordered() {
        let a = CustomerRecord::new(CreateCustomer {
            store_id: "store-1".to_string(),
            name: "First".to_string(),
            description: String::new(),
        });
        let b = CustomerRecord::new(CreateCustomer {
            store_id: "store-1".to_string(),
            name: "Second".to_string(),
            description: String::new(),
        });
        // v7 UUIDs sort by creation time
        assert!(a.id < b.id);
    }

    #[test]
    fn test_customer_embedding_text() {
        let customer = CustomerRecord::new(CreateCustomer {
            store_id: "store-1".to_string(),
            name: "Acme".to_string(),
            description: "Sells widgets".to_string(),
        });
        assert_eq!(customer.embedding_text(), "Acme: Sells widgets");
    }

    #[test]
    fn test_apply_update_touches_updated_at() {
        let mut customer = CustomerRecord::new(CreateCustomer {
            store_id: "store-1".to_string(),
            name: "Acme".to_string(),
            description: "Old".to_string(),
        });
        let created = customer.created_at;
        customer.apply_update(UpdateCustomer {
            name: None,
            description: Some("New".to_string()),
        });
        assert_eq!(customer.name, "Acme");
        assert_eq!(customer.description, "New");
        assert!(customer.updated_at >= created);
    }

    #[test]
    fn test_index_outcome() {
        assert!(IndexOutcome::Indexed.is_indexed());
        assert!(!IndexOutcome::skipped("index down").is_indexed());
    }
}
