//! Pinecone vector index client.
//!
//! Wraps the Pinecone REST API: filtered nearest-neighbor query, upsert with
//! metadata, delete by id, and index stats. The client connects once at
//! startup by resolving the index host from the control plane, then issues
//! all data-plane calls against that host.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::ServiceError;
use crate::models::ClassTag;
use crate::traits::{IndexMatch, VectorIndex};

const CONTROL_PLANE_BASE: &str = "https://api.pinecone.io";

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
    #[serde(default)]
    dimension: Option<u32>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    class: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    vectors: Vec<WireVector>,
}

#[derive(Debug, Serialize)]
struct WireVector {
    id: String,
    values: Vec<f32>,
    metadata: Value,
}

#[derive(Debug, Serialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "totalVectorCount", default)]
    total_vector_count: u64,
}

/// Client for one externally-hosted Pinecone index.
pub struct PineconeClient {
    client: Client,
    api_key: String,
    index_host: String,
    index_name: String,
    dimension: Option<u32>,
}

impl PineconeClient {
    /// Resolve the index host from the control plane and build a client
    /// bound to it. Called once at startup.
    pub async fn connect(api_key: String, index_name: &str) -> Result<Self> {
        let client = Client::new();
        let response = client
            .get(format!("{CONTROL_PLANE_BASE}/indexes/{index_name}"))
            .header("Api-Key", &api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "failed to describe index '{index_name}' ({status}): {error_text}"
            ));
        }

        let described: DescribeIndexResponse = response.json().await?;
        info!(
            "✓ Connected to index '{}' at {}",
            index_name, described.host
        );

        Ok(Self {
            client,
            api_key,
            index_host: format!("https://{}", described.host),
            index_name: index_name.to_string(),
            dimension: described.dimension,
        })
    }

    /// Build a client against a known data-plane host, skipping the control
    /// plane round-trip.
    pub fn with_host(api_key: String, index_host: String, index_name: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            index_host,
            index_name,
            dimension: None,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Dimension reported by the control plane, when known.
    pub fn dimension(&self) -> Option<u32> {
        self.dimension
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let response = self
            .client
            .post(format!("{}{}", self.index_host, path))
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Index(format!("POST {path}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("index call {path} failed ({status}): {error_text}");
            return Err(ServiceError::Index(format!("POST {path} returned {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Index(format!("decoding {path} response: {e}")))
    }

    fn class_filter(class: Option<ClassTag>) -> Option<Value> {
        class.map(|tag| json!({ "class": { "$eq": tag.as_str() } }))
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        class: Option<ClassTag>,
    ) -> Result<Vec<IndexMatch>, ServiceError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            filter: Self::class_filter(class),
        };

        let response: QueryResponse = self.post_json("/query", &request).await?;

        response
            .matches
            .into_iter()
            .map(|m| {
                let id = m
                    .id
                    .parse::<i64>()
                    .map_err(|_| ServiceError::Index(format!("non-integer record id '{}'", m.id)))?;
                Ok(IndexMatch {
                    id,
                    score: m.score,
                    class: m.metadata.and_then(|meta| meta.class).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn upsert(&self, id: i64, vector: Vec<f32>, class: ClassTag) -> Result<(), ServiceError> {
        let request = UpsertRequest {
            vectors: vec![WireVector {
                id: id.to_string(),
                values: vector,
                metadata: json!({ "class": class.as_str() }),
            }],
        };

        let _: Value = self.post_json("/vectors/upsert", &request).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let request = DeleteRequest {
            ids: vec![id.to_string()],
        };

        let _: Value = self.post_json("/vectors/delete", &request).await?;
        Ok(())
    }

    async fn total_vectors(&self) -> Result<u64, ServiceError> {
        let stats: StatsResponse = self.post_json("/describe_index_stats", &json!({})).await?;
        Ok(stats.total_vector_count)
    }
}
