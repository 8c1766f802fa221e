//! Core traits for the feature extractor and the vector index client.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::ServiceError;
use crate::models::ClassTag;

/// A nearest-neighbor match returned by the index, in the index's native
/// descending-similarity order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    /// String-encoded integer id, parsed back to an integer.
    pub id: i64,
    /// Similarity score in the index's native range.
    pub score: f32,
    /// Stored metadata class tag.
    pub class: String,
}

/// Trait for clients that turn image files into embedding vectors.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// Extract one embedding per input path. Any path that fails to decode
    /// fails the whole batch.
    async fn extract(&self, paths: &[PathBuf]) -> Result<Vec<Vec<f32>>, ServiceError>;

    /// Output width of the embedding.
    fn dimension(&self) -> u32;
}

/// Trait for clients of an externally-hosted vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `top_k` nearest neighbors to `vector`, restricted to
    /// records whose metadata class equals `class` when one is given.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        class: Option<ClassTag>,
    ) -> Result<Vec<IndexMatch>, ServiceError>;

    /// Insert or replace the record at `id`.
    async fn upsert(
        &self,
        id: i64,
        vector: Vec<f32>,
        class: ClassTag,
    ) -> Result<(), ServiceError>;

    /// Remove the record at `id`. Deleting an unknown id is not an error.
    async fn delete(&self, id: i64) -> Result<(), ServiceError>;

    /// Total number of records currently in the index.
    async fn total_vectors(&self) -> Result<u64, ServiceError>;
}
