//! Visual Search Service - Main Entry Point
//!
//! Loads the feature extraction model and connects to the vector index once
//! at startup, then serves the search and update endpoints.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visearch::config::Config;
use visearch::handlers::{self, AppState};
use visearch::traits::FeatureExtractor;
use visearch::{ImageFetcher, PineconeClient, SearchService, VggExtractor};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "visearch=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("🚀 Starting Visual Search Service v{}", env!("CARGO_PKG_VERSION"));
    info!("📦 Model: {} ({}D)", config.model_name, config.model_dimension);
    info!("🔧 Port: {}", config.port);

    // Validate model files exist
    match config.validate_model_files() {
        Ok(_) => info!("✅ Model files validated"),
        Err(e) => {
            tracing::error!("❌ Model files missing: {}", e);
            tracing::error!("Please export the model first:");
            tracing::error!("  - Model: {}", config.model_path);
            tracing::error!("");
            tracing::error!("A headless vgg19 ONNX export works, e.g. from timm:");
            tracing::error!("  https://huggingface.co/timm/vgg19.tv_in1k");
            return Err(anyhow::anyhow!(e));
        }
    }

    // Load the feature extraction model
    let extractor = VggExtractor::new(config.to_vgg_config())?;
    info!("✅ Feature extraction model initialized");

    // Connect to the vector index
    let index = PineconeClient::connect(config.pinecone_api_key.clone(), &config.index_name)
        .await?;
    if let Some(remote_dim) = index.dimension() {
        if remote_dim != extractor.dimension() {
            warn!(
                "index '{}' stores {}D vectors but the extractor emits {}D",
                config.index_name,
                remote_dim,
                extractor.dimension()
            );
        }
    }
    info!("✅ Vector index '{}' connected", config.index_name);

    // Assemble the service
    let fetcher = ImageFetcher::new(&config.scratch_dir)?;
    let service = SearchService::new(fetcher, Arc::new(extractor), Arc::new(index));

    let state = Arc::new(AppState {
        service,
        config: config.clone(),
    });

    // Build HTTP routes
    let app = handlers::router(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("✅ Visual Search Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
