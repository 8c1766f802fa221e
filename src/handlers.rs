//! HTTP handlers module.
//!
//! Validates form input, drives the search service, and shapes responses.
//! Validation failures and downstream errors map to wire status codes in one
//! place (`ServiceError::into_response`).

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::ServiceError;
use crate::models::{
    HealthResponse, MessageResponse, SearchHit, SearchParams, UpdateCase, UpdateParams,
};
use crate::services::SearchService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: SearchService,
    pub config: Config,
}

/// Build the HTTP route table.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(search))
        .route("/updating_or_deleting", post(update_or_delete))
        .route("/health", get(health_check))
        .with_state(state)
}

const TOP_K_LIMIT: i64 = 10000;

/// Similarity search endpoint.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Form(params): Form<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ServiceError> {
    if params.top_k <= 0 || params.top_k > TOP_K_LIMIT {
        return Err(ServiceError::Validation(format!(
            "'top_k' must be a positive integer no greater than {TOP_K_LIMIT}."
        )));
    }

    if let Some(threshold) = params.threshold {
        if threshold <= 0.0 || threshold > 1.0 {
            return Err(ServiceError::Validation(
                "'threshold' must be a float greater than 0.0 and at most 1.0.".to_string(),
            ));
        }
    }

    info!(
        url = %params.image_url,
        top_k = params.top_k,
        class = ?params.class_type,
        "similarity search"
    );

    let hits = state
        .service
        .search(
            &params.image_url,
            params.top_k as usize,
            params.class_type.as_tag(),
            params.threshold,
        )
        .await?;

    Ok(Json(hits))
}

/// Upsert or delete a record in the index.
pub async fn update_or_delete(
    State(state): State<Arc<AppState>>,
    Form(params): Form<UpdateParams>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let message = match params.case {
        UpdateCase::Upsert => {
            let (image_url, class) = match (params.image_url, params.class_type) {
                (Some(url), Some(class)) => (url, class),
                _ => {
                    return Err(ServiceError::Validation(
                        "'image_url' and 'class_type' are mandatory for case 'Upsert'."
                            .to_string(),
                    ));
                }
            };

            info!(image_id = params.image_id, url = %image_url, "upserting record");
            state.service.upsert(params.image_id, &image_url, class).await?
        }
        UpdateCase::Delete => {
            info!(image_id = params.image_id, "deleting record");
            state.service.delete(params.image_id).await?
        }
    };

    Ok(Json(MessageResponse { message }))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "visearch".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model_name.clone(),
        dimension: state.config.model_dimension,
        index: state.config.index_name.clone(),
        endpoints: vec![
            "/".to_string(),
            "/updating_or_deleting".to_string(),
            "/health".to_string(),
        ],
    })
}
