use axum::{extract::State, response::IntoResponse};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service banner
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::ok(json!({
        "name": "vocab-api",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Personal vocabulary lists with training progress",
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/v1/auth/register, /api/v1/auth/login (public), /api/v1/auth/whoami (protected)",
            "vocab": "/api/v1/vocab[/:word_id[/status|/training]] (protected)",
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let now = chrono::Utc::now();

    match state.words.store().health_check().await {
        Ok(()) => Ok(ApiResponse::ok(json!({
            "status": "ok",
            "timestamp": now,
            "store": state.backend,
        }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Store unavailable"))
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    ApiError::not_found("Page not found")
}
