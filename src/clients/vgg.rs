//! Local feature extraction using ONNX Runtime.
//!
//! Runs a VGG19 network with its classification head removed, so the output
//! is the penultimate feature representation. The session is created once at
//! startup and shared behind a mutex; inference is deterministic for
//! identical input bytes and weights.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::DynamicImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::traits::FeatureExtractor;

/// ImageNet per-channel normalization constants.
const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Configuration for the local feature extraction model.
#[derive(Debug, Clone)]
pub struct VggModelConfig {
    /// Path to the ONNX model file.
    pub model_path: String,
    /// Model name for identification.
    pub model_name: String,
    /// Flattened output embedding dimension.
    pub dimension: u32,
    /// Square input resolution the image is resized to.
    pub input_size: u32,
}

impl Default for VggModelConfig {
    fn default() -> Self {
        Self {
            model_path: "./models/vgg19.onnx".to_string(),
            model_name: "vgg19".to_string(),
            dimension: 4096,
            input_size: 224,
        }
    }
}

/// Feature extractor backed by an ONNX Runtime session.
pub struct VggExtractor {
    session: Arc<Mutex<Session>>,
    config: VggModelConfig,
}

impl VggExtractor {
    /// Create a new extractor from the configured model file.
    pub fn new(config: VggModelConfig) -> Result<Self> {
        info!("Initializing feature extraction model: {}", config.model_name);

        if !Path::new(&config.model_path).exists() {
            return Err(anyhow!(
                "Model file not found: {}. Please download the model first.",
                config.model_path
            ));
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&config.model_path)?;

        info!("✓ ONNX session created for {}", config.model_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            config,
        })
    }

    /// Create with default configuration (vgg19, 224x224, 4096-D output).
    pub fn with_defaults() -> Result<Self> {
        Self::new(VggModelConfig::default())
    }

    /// Resize to the model's square input resolution, normalize each channel
    /// with the ImageNet constants, and lay the pixels out CHW.
    fn preprocess(image: &DynamicImage, input_size: u32) -> Vec<f32> {
        let size = input_size as usize;
        let resized = image
            .resize_exact(input_size, input_size, image::imageops::FilterType::Triangle)
            .to_rgb8();
        let pixels = resized.as_raw();

        let mut data = vec![0.0f32; 3 * size * size];
        for i in 0..(size * size) {
            for c in 0..3 {
                let value = pixels[i * 3 + c] as f32 / 255.0;
                data[c * size * size + i] = (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
            }
        }
        data
    }

    /// Run inference on a single image file.
    fn run_inference(&self, path: &Path) -> Result<Vec<f32>, ServiceError> {
        let image = image::open(path)
            .map_err(|e| ServiceError::Extraction(format!("decoding {}: {e}", path.display())))?;

        let size = self.config.input_size as usize;
        let data = Self::preprocess(&image, self.config.input_size);

        let input = Tensor::from_array(([1usize, 3, size, size], data.into_boxed_slice()))
            .map_err(|e| ServiceError::Extraction(format!("building input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ServiceError::Extraction(format!("locking session: {e}")))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| ServiceError::Extraction(format!("running model: {e}")))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| ServiceError::Extraction("no output tensor found".to_string()))?
            .1;

        let (shape, values) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ServiceError::Extraction(format!("reading output tensor: {e}")))?;

        // Flatten the activation map to a 1-D vector, whatever its shape.
        debug!(?shape, "feature map extracted");
        Ok(values.to_vec())
    }
}

#[async_trait]
impl FeatureExtractor for VggExtractor {
    async fn extract(&self, paths: &[PathBuf]) -> Result<Vec<Vec<f32>>, ServiceError> {
        paths.iter().map(|path| self.run_inference(path)).collect()
    }

    fn dimension(&self) -> u32 {
        self.config.dimension
    }
}
