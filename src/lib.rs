//! Visual Search Service - Library Entry Point
//!
//! A thin HTTP service for visual similarity search: downloads an image by
//! URL, embeds it with a pretrained convolutional network, and queries an
//! externally-hosted vector index for nearest neighbors.

pub mod clients;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod models;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use clients::{PineconeClient, VggExtractor, VggModelConfig};
pub use config::Config;
pub use error::ServiceError;
pub use fetcher::ImageFetcher;
pub use services::SearchService;
pub use traits::{FeatureExtractor, IndexMatch, VectorIndex};
