//! Configuration module for the visual search service.

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::clients::VggModelConfig;

/// Main service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub model_path: String,
    pub model_name: String,
    pub model_dimension: u32,
    pub image_size: u32,
    pub index_name: String,
    pub scratch_dir: String,
    pub pinecone_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when `PINECONE_API_KEY` is absent; everything else has a
    /// default.
    pub fn from_env() -> Result<Self> {
        let pinecone_api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| anyhow!("PINECONE_API_KEY must be set"))?;

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "./models/vgg19.onnx".to_string()),
            model_name: std::env::var("MODEL_NAME").unwrap_or_else(|_| "vgg19".to_string()),
            model_dimension: std::env::var("MODEL_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
            image_size: std::env::var("IMAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(224),
            index_name: std::env::var("PINECONE_INDEX")
                .unwrap_or_else(|_| "image-search-live".to_string()),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .unwrap_or_else(|_| "./download-images".to_string()),
            pinecone_api_key,
        })
    }

    /// Check that the ONNX model file is present on disk.
    pub fn validate_model_files(&self) -> Result<(), String> {
        if !Path::new(&self.model_path).exists() {
            return Err(format!("model file not found: {}", self.model_path));
        }
        Ok(())
    }

    pub fn to_vgg_config(&self) -> VggModelConfig {
        VggModelConfig {
            model_path: self.model_path.clone(),
            model_name: self.model_name.clone(),
            dimension: self.model_dimension,
            input_size: self.image_size,
        }
    }
}
