// Qdrant-backed knowledge index (read-only)
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, PointId, ScoredPoint, SearchPointsBuilder,
    Value as QdrantValue,
};
use qdrant_client::{Qdrant, QdrantError};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::errors::{has_not_found_signature, has_unavailable_signature, ProviderError};
use crate::providers::{SearchHit, VectorIndex};

/// Default gRPC endpoint
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Collection holding the product knowledge snippets
pub const DEFAULT_COLLECTION: &str = "product_knowledge";

/// Read-only view of a Qdrant deployment
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
}

impl QdrantIndex {
    /// Connect to Qdrant (lazily; no request is made until the first search)
    pub fn new(url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let mut builder = Qdrant::from_url(url).timeout(timeout);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Index(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Number of points stored in `collection`, `None` if it does not exist
    pub async fn collection_points(&self, collection: &str) -> Result<Option<u64>, ProviderError> {
        match self.client.collection_info(collection).await {
            Ok(info) => Ok(Some(info.result.and_then(|r| r.points_count).unwrap_or(0))),
            Err(e) => {
                let err = map_qdrant_error(collection, e);
                if err.is_collection_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let request =
            SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(true);

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| map_qdrant_error(collection, e))?;

        debug!(collection, hits = response.result.len(), "qdrant search");

        Ok(response.result.into_iter().map(scored_point_to_hit).collect())
    }
}

fn map_qdrant_error(collection: &str, error: QdrantError) -> ProviderError {
    classify_index_error(collection, error.to_string())
}

fn classify_index_error(collection: &str, message: String) -> ProviderError {
    if has_not_found_signature(&message) {
        ProviderError::CollectionNotFound(collection.to_string())
    } else if has_unavailable_signature(&message) {
        ProviderError::IndexUnavailable(message)
    } else {
        ProviderError::Index(message)
    }
}

fn scored_point_to_hit(point: ScoredPoint) -> SearchHit {
    let mut payload = HashMap::new();
    for (key, value) in point.payload {
        if let Some(json) = qdrant_to_json_value(&value) {
            payload.insert(key, json);
        }
    }

    if let Some(id) = point_id_to_string(&point.id) {
        payload.entry("id".to_string()).or_insert(JsonValue::String(id));
    }

    SearchHit {
        score: point.score,
        payload,
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        Kind::NullValue(_) => Some(JsonValue::Null),
        Kind::ListValue(list) => Some(JsonValue::Array(
            list.values.iter().filter_map(qdrant_to_json_value).collect(),
        )),
        Kind::StructValue(s) => Some(JsonValue::Object(
            s.fields
                .iter()
                .filter_map(|(k, v)| qdrant_to_json_value(v).map(|j| (k.clone(), j)))
                .collect(),
        )),
    })
}

fn point_id_to_string(point_id: &Option<PointId>) -> Option<String> {
    point_id.as_ref().and_then(|id| match &id.point_id_options {
        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
        Some(PointIdOptions::Uuid(u)) => Some(u.clone()),
        None => None,
    })
}
