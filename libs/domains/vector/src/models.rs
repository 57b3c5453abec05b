use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distance metric for similarity calculations
///
/// Defaults to Euclidean: the reference 384-dimension MiniLM setup indexes
/// with L2 distance, and similarity scores are derived as `1 / (1 + d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
    DotProduct,
    Manhattan,
}

/// Configuration for a vector collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub collection: String,
    pub dimension: u32,
    pub metric: DistanceMetric,
}

impl IndexConfig {
    pub fn new(collection: impl Into<String>, dimension: u32) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            metric: DistanceMetric::default(),
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// Embedding model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbeddingModel {
    /// sentence-transformers/all-MiniLM-L6-v2 (384 dimensions)
    #[default]
    AllMiniLmL6V2,
    /// Custom model with specified dimension
    Custom(u32),
}

impl EmbeddingModel {
    pub fn dimension(&self) -> u32 {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => 384,
            EmbeddingModel::Custom(dim) => *dim,
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingModel::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            EmbeddingModel::Custom(_) => "custom",
        }
    }
}

/// A point to be written into the index
///
/// The point `id` is assigned here and is internal to the index; the
/// `record_id` ties the point back to the store of record and is what
/// callers use for deletion and result joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: Uuid,
    pub record_id: Uuid,
    pub tenant: String,
    pub source_text: String,
    pub values: Vec<f32>,
}

impl VectorRecord {
    pub fn new(
        record_id: Uuid,
        tenant: impl Into<String>,
        source_text: impl Into<String>,
        values: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            record_id,
            tenant: tenant.into(),
            source_text: source_text.into(),
            values,
        }
    }
}

/// Search query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: u64,
    /// Restrict results to a single tenant's points
    pub tenant: Option<String>,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, limit: u64) -> Self {
        Self {
            vector,
            limit,
            tenant: None,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }
}

/// A single search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    pub record_id: Uuid,
    pub distance: f32,
    pub source_text: Option<String>,
}

impl VectorHit {
    pub fn new(record_id: Uuid, distance: f32, source_text: Option<String>) -> Self {
        Self {
            record_id,
            distance,
            source_text,
        }
    }

    /// Similarity score in (0, 1], derived from the raw distance as
    /// `1 / (1 + d)`. A distance of 0 (exact match) scores 1.0.
    pub fn similarity(&self) -> f32 {
        1.0 / (1.0 + self.distance.max(0.0))
    }
}
