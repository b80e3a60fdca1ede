use crate::core::{BatchRequest, Storage};
use crate::domain::GenerateResponse;
use crate::server::errors::ApiError;
use crate::server::state::AppState;
use crate::utils::validation::Validate;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the AG-Generator API v4. See /health for service status."
    }))
}

pub async fn health<S: Storage + 'static>(State(state): State<Arc<AppState<S>>>) -> Json<Value> {
    let storage = if state.storage_configured() {
        "configured"
    } else {
        "unconfigured"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
    }))
}

/// One handler for all three generators; the request type picks the batch plan.
pub async fn generate<S, R>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<R>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError>
where
    S: Storage + 'static,
    R: BatchRequest + DeserializeOwned + 'static,
{
    // 先檢查請求內容，再確認儲存是否可用
    let Json(request) = payload?;
    request.validate()?;
    let engine = state.engine()?;

    let response = engine.run(&request).await?;
    tracing::info!(
        generator = R::GENERATOR,
        job_id = %response.job_id,
        files = response.public_urls.len(),
        "✅ Batch completed"
    );
    Ok(Json(response))
}
