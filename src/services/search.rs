//! Search service.
//!
//! Ties the fetcher, the feature extractor, and the vector index together.
//! Built once at startup and handed to the handlers, so tests can swap in a
//! mock index and a stub extractor.

use std::sync::Arc;
use tracing::info;

use crate::error::ServiceError;
use crate::fetcher::ImageFetcher;
use crate::models::{ClassTag, SearchHit};
use crate::traits::{FeatureExtractor, VectorIndex};

pub struct SearchService {
    fetcher: ImageFetcher,
    extractor: Arc<dyn FeatureExtractor>,
    index: Arc<dyn VectorIndex>,
}

impl SearchService {
    pub fn new(
        fetcher: ImageFetcher,
        extractor: Arc<dyn FeatureExtractor>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            index,
        }
    }

    /// Download the image, embed it, and return its nearest neighbors.
    pub async fn search(
        &self,
        image_url: &str,
        top_k: usize,
        class: Option<ClassTag>,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let vector = self.embed_url(image_url).await?;
        self.query_index(&vector, top_k, class, threshold).await
    }

    /// Query the index with an already-computed vector, applying the class
    /// filter and dropping hits at or below the threshold when one is given.
    pub async fn query_index(
        &self,
        vector: &[f32],
        top_k: usize,
        class: Option<ClassTag>,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let matches = self.index.query(vector, top_k, class).await?;

        let hits = matches
            .into_iter()
            .filter(|m| threshold.map_or(true, |t| m.score > t))
            .map(|m| SearchHit {
                id: m.id,
                score: m.score,
                class: m.class,
            })
            .collect();

        Ok(hits)
    }

    /// Download and embed the image at `image_url`, then insert or replace
    /// the record at `image_id`.
    pub async fn upsert(
        &self,
        image_id: i64,
        image_url: &str,
        class: ClassTag,
    ) -> Result<String, ServiceError> {
        let vector = self.embed_url(image_url).await?;
        self.index.upsert(image_id, vector, class).await?;

        let count = self.index.total_vectors().await?;
        info!(image_id, count, "record upserted");
        Ok(format!("Upserting Done: Count Now is {count} vectors."))
    }

    /// Remove the record at `image_id`. Unknown ids are not an error.
    pub async fn delete(&self, image_id: i64) -> Result<String, ServiceError> {
        self.index.delete(image_id).await?;

        let count = self.index.total_vectors().await?;
        info!(image_id, count, "record deleted");
        Ok(format!("Deleting Done: Count Now is {count} vectors."))
    }

    async fn embed_url(&self, image_url: &str) -> Result<Vec<f32>, ServiceError> {
        let image = self.fetcher.download(image_url).await?;
        let mut features = self
            .extractor
            .extract(&[image.path().to_path_buf()])
            .await?;
        // Scratch file is removed once inference has consumed it.
        drop(image);

        features
            .pop()
            .ok_or_else(|| ServiceError::Extraction("extractor returned no features".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::IndexMatch;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubExtractor;

    #[async_trait]
    impl FeatureExtractor for StubExtractor {
        async fn extract(&self, paths: &[PathBuf]) -> Result<Vec<Vec<f32>>, ServiceError> {
            Ok(paths.iter().map(|_| vec![0.0; 8]).collect())
        }

        fn dimension(&self) -> u32 {
            8
        }
    }

    #[derive(Default)]
    struct MockIndex {
        matches: Vec<IndexMatch>,
        total: u64,
        upserts: AtomicUsize,
        deletes: AtomicUsize,
        seen_class: std::sync::Mutex<Option<Option<ClassTag>>>,
    }

    #[async_trait]
    impl VectorIndex for MockIndex {
        async fn query(
            &self,
            _vector: &[f32],
            top_k: usize,
            class: Option<ClassTag>,
        ) -> Result<Vec<IndexMatch>, ServiceError> {
            *self.seen_class.lock().unwrap() = Some(class);
            let mut matches: Vec<IndexMatch> = match class {
                Some(tag) => self
                    .matches
                    .iter()
                    .filter(|m| m.class == tag.as_str())
                    .cloned()
                    .collect(),
                None => self.matches.clone(),
            };
            matches.truncate(top_k);
            Ok(matches)
        }

        async fn upsert(
            &self,
            _id: i64,
            _vector: Vec<f32>,
            _class: ClassTag,
        ) -> Result<(), ServiceError> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, _id: i64) -> Result<(), ServiceError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn total_vectors(&self) -> Result<u64, ServiceError> {
            Ok(self.total)
        }
    }

    fn sample_matches() -> Vec<IndexMatch> {
        vec![
            IndexMatch { id: 1, score: 0.95, class: "class-a".to_string() },
            IndexMatch { id: 2, score: 0.80, class: "class-b".to_string() },
            IndexMatch { id: 3, score: 0.60, class: "class-a".to_string() },
            IndexMatch { id: 4, score: 0.40, class: "class-b".to_string() },
        ]
    }

    fn service_with(index: Arc<MockIndex>) -> SearchService {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(dir.path()).unwrap();
        SearchService::new(fetcher, Arc::new(StubExtractor), index)
    }

    #[tokio::test]
    async fn test_query_all_leaves_filter_unset() {
        let index = Arc::new(MockIndex {
            matches: sample_matches(),
            total: 4,
            ..Default::default()
        });
        let service = service_with(index.clone());

        let hits = service.query_index(&[0.0; 8], 10, None, None).await.unwrap();
        assert_eq!(hits.len(), 4);
        assert_eq!(*index.seen_class.lock().unwrap(), Some(None));
    }

    #[tokio::test]
    async fn test_query_class_filter_restricts_results() {
        let index = Arc::new(MockIndex {
            matches: sample_matches(),
            total: 4,
            ..Default::default()
        });
        let service = service_with(index.clone());

        let hits = service
            .query_index(&[0.0; 8], 10, Some(ClassTag::ClassA), None)
            .await
            .unwrap();
        assert!(hits.iter().all(|h| h.class == "class-a"));
        assert_eq!(hits.len(), 2);
        assert_eq!(
            *index.seen_class.lock().unwrap(),
            Some(Some(ClassTag::ClassA))
        );
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let index = Arc::new(MockIndex {
            matches: sample_matches(),
            total: 4,
            ..Default::default()
        });
        let service = service_with(index);

        // 0.80 is not strictly greater than 0.80, so id=2 is dropped.
        let hits = service
            .query_index(&[0.0; 8], 10, None, Some(0.80))
            .await
            .unwrap();
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_no_threshold_returns_top_k_unfiltered() {
        let index = Arc::new(MockIndex {
            matches: sample_matches(),
            total: 4,
            ..Default::default()
        });
        let service = service_with(index);

        let hits = service.query_index(&[0.0; 8], 2, None, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_reports_count() {
        let index = Arc::new(MockIndex {
            total: 10,
            ..Default::default()
        });
        let service = service_with(index.clone());

        let msg = service.delete(42).await.unwrap();
        assert_eq!(msg, "Deleting Done: Count Now is 10 vectors.");
        // Deleting the same id again still succeeds.
        let msg = service.delete(42).await.unwrap();
        assert_eq!(msg, "Deleting Done: Count Now is 10 vectors.");
        assert_eq!(index.deletes.load(Ordering::SeqCst), 2);
    }
}
