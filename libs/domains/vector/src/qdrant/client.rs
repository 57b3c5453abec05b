use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    DeletePointsBuilder, Distance, FieldType, Filter, PointId, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{VectorError, VectorResult};
use crate::index::VectorIndex;
use crate::models::{DistanceMetric, IndexConfig, SearchQuery, VectorHit, VectorRecord};

const RECORD_ID_FIELD: &str = "record_id";
const TENANT_FIELD: &str = "tenant";
const SOURCE_TEXT_FIELD: &str = "source_text";

/// Qdrant-backed implementation of VectorIndex
pub struct QdrantIndex {
    client: Qdrant,
}

impl QdrantIndex {
    pub fn new(config: &QdrantConfig) -> VectorResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| VectorError::Config(format!("Failed to build Qdrant client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::DotProduct => Distance::Dot,
            DistanceMetric::Manhattan => Distance::Manhattan,
        }
    }

    fn to_payload(record: &VectorRecord) -> HashMap<String, QdrantValue> {
        let mut payload = HashMap::new();
        payload.insert(
            RECORD_ID_FIELD.to_string(),
            QdrantValue::from(record.record_id.to_string()),
        );
        payload.insert(
            TENANT_FIELD.to_string(),
            QdrantValue::from(record.tenant.clone()),
        );
        payload.insert(
            SOURCE_TEXT_FIELD.to_string(),
            QdrantValue::from(record.source_text.clone()),
        );
        payload
    }

    fn payload_string(payload: &HashMap<String, QdrantValue>, field: &str) -> Option<String> {
        match payload.get(field).and_then(|v| v.kind.as_ref()) {
            Some(qdrant::value::Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn hit_from_point(point: qdrant::ScoredPoint) -> VectorResult<VectorHit> {
        let record_id = Self::payload_string(&point.payload, RECORD_ID_FIELD)
            .ok_or_else(|| VectorError::Internal("Point missing record_id payload".to_string()))?;

        let record_id = Uuid::parse_str(&record_id)
            .map_err(|e| VectorError::Internal(format!("Invalid record_id payload: {}", e)))?;

        let source_text = Self::payload_string(&point.payload, SOURCE_TEXT_FIELD);

        // Euclidean collections report the raw L2 distance as the score
        Ok(VectorHit::new(record_id, point.score, source_text))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, config: &IndexConfig) -> VectorResult<()> {
        if self.client.collection_exists(&config.collection).await? {
            debug!(collection = %config.collection, "Collection already exists");
        } else {
            let builder = CreateCollectionBuilder::new(&config.collection).vectors_config(
                VectorParamsBuilder::new(
                    config.dimension as u64,
                    Self::to_qdrant_distance(config.metric),
                ),
            );

            match self.client.create_collection(builder).await {
                Ok(_) => {
                    info!(
                        collection = %config.collection,
                        dimension = config.dimension,
                        "Created vector collection"
                    );
                }
                Err(err) => {
                    // Another writer may have created it between the
                    // existence check and the create call.
                    if !self.client.collection_exists(&config.collection).await? {
                        return Err(err.into());
                    }
                    debug!(collection = %config.collection, "Lost collection create race");
                }
            }
        }

        // Payload indexes back the filter-based delete and tenant scoping.
        // Creating an index that already exists is a no-op on the server.
        for field in [RECORD_ID_FIELD, TENANT_FIELD] {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &config.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await?;
        }

        Ok(())
    }

    async fn insert(&self, collection: &str, record: VectorRecord) -> VectorResult<Uuid> {
        let ids = self.insert_batch(collection, vec![record]).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| VectorError::Internal("Upsert returned no point id".to_string()))
    }

    async fn insert_batch(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> VectorResult<Vec<Uuid>> {
        if records.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let payload = Self::to_payload(&record);
                PointStruct::new(
                    PointId::from(record.id.to_string()),
                    record.values,
                    payload,
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?;

        Ok(ids)
    }

    async fn delete_by_record(&self, collection: &str, record_id: Uuid) -> VectorResult<()> {
        let filter = Filter::must([Condition::matches(
            RECORD_ID_FIELD,
            record_id.to_string(),
        )]);

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(filter)
                    .wait(true),
            )
            .await?;

        debug!(%record_id, collection, "Deleted index points for record");
        Ok(())
    }

    async fn search(&self, collection: &str, query: SearchQuery) -> VectorResult<Vec<VectorHit>> {
        let mut builder =
            SearchPointsBuilder::new(collection, query.vector, query.limit).with_payload(true);

        if let Some(tenant) = query.tenant {
            builder = builder.filter(Filter::must([Condition::matches(TENANT_FIELD, tenant)]));
        }

        let results = self.client.search_points(builder).await?;

        results
            .result
            .into_iter()
            .map(Self::hit_from_point)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DistanceMetric;

    #[test]
    fn test_distance_mapping() {
        assert_eq!(
            QdrantIndex::to_qdrant_distance(DistanceMetric::Euclidean),
            Distance::Euclid
        );
        assert_eq!(
            QdrantIndex::to_qdrant_distance(DistanceMetric::Cosine),
            Distance::Cosine
        );
    }

    #[test]
    fn test_payload_carries_record_fields() {
        let record_id = Uuid::new_v4();
        let record = VectorRecord::new(record_id, "store-1", "Acme: widgets", vec![0.1; 4]);
        let payload = QdrantIndex::to_payload(&record);

        assert_eq!(
            QdrantIndex::payload_string(&payload, RECORD_ID_FIELD),
            Some(record_id.to_string())
        );
        assert_eq!(
            QdrantIndex::payload_string(&payload, TENANT_FIELD),
            Some("store-1".to_string())
        );
        assert_eq!(
            QdrantIndex::payload_string(&payload, SOURCE_TEXT_FIELD),
            Some("Acme: widgets".to_string())
        );
    }

    #[tokio::test]
    #[ignore] // Requires actual Qdrant
    async fn test_ensure_collection_live() {
        let config = QdrantConfig::from_env().unwrap();
        let index = QdrantIndex::new(&config).unwrap();
        let result = index.ensure_collection(&config.index_config()).await;
        assert!(result.is_ok());
    }
}
