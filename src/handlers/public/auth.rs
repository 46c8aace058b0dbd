use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::users::{LoginToken, UserProfile};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let Json(req) = payload?;
    let profile = state
        .users
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok(ApiResponse::created(profile))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginToken> {
    let Json(req) = payload?;
    let token = state.users.login(&req.email, &req.password).await?;
    Ok(ApiResponse::ok(token))
}
