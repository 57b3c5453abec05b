use crate::error::VectorResult;
use crate::models::{DistanceMetric, IndexConfig};

/// Qdrant connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub dimension: u32,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            collection: "knowledge_base".to_string(),
            dimension: 384,
            timeout_secs: 30,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The IndexConfig this connection targets
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new(&self.collection, self.dimension).with_metric(DistanceMetric::Euclidean)
    }

    pub fn from_env() -> VectorResult<Self> {
        let url =
            std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());

        let api_key = std::env::var("QDRANT_API_KEY").ok();

        let collection =
            std::env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "knowledge_base".to_string());

        let dimension = std::env::var("QDRANT_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(384);

        let timeout_secs = std::env::var("QDRANT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            url,
            api_key,
            collection,
            dimension,
            timeout_secs,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new("http://localhost:6334")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QdrantConfig::default();
        assert_eq!(config.url, "http://localhost:6334");
        assert_eq!(config.collection, "knowledge_base");
        assert_eq!(config.dimension, 384);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_index_config() {
        let config = QdrantConfig::new("http://qdrant:6334")
            .with_collection("customers")
            .with_dimension(768);
        let index = config.index_config();
        assert_eq!(index.collection, "customers");
        assert_eq!(index.dimension, 768);
        assert_eq!(index.metric, DistanceMetric::Euclidean);
    }
}
