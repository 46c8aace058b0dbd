use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::words::{Training, Word, WordId, WordUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateWordRequest {
    pub word: String,
    pub definition: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub is_learned: bool,
}

#[derive(Debug, Deserialize)]
pub struct TrainingRequest {
    pub training: Training,
    pub result: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub id: WordId,
    pub is_learned: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub id: WordId,
    pub deleted: bool,
}

/// GET /api/v1/vocab - the caller's words, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Word>> {
    let words = state.words.list_words(user.user_id).await?;
    Ok(ApiResponse::ok(words))
}

/// POST /api/v1/vocab
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateWordRequest>, JsonRejection>,
) -> ApiResult<Word> {
    let Json(req) = payload?;
    let word = state
        .words
        .create_word(user.user_id, &req.word, &req.definition)
        .await?;
    Ok(ApiResponse::created(word))
}

/// PATCH /api/v1/vocab - batch of per-word field updates
pub async fn patch_batch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Vec<WordUpdate>>, JsonRejection>,
) -> ApiResult<BatchResult> {
    let Json(batch) = payload?;
    state.words.apply_batch(user.user_id, &batch).await?;
    Ok(ApiResponse::ok(BatchResult {
        updated: batch.len(),
    }))
}

/// GET /api/v1/vocab/:word_id
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    word_id: Result<Path<WordId>, PathRejection>,
) -> ApiResult<Word> {
    let Path(word_id) = word_id?;
    let word = state.words.find_word(user.user_id, word_id).await?;
    Ok(ApiResponse::ok(word))
}

/// DELETE /api/v1/vocab/:word_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    word_id: Result<Path<WordId>, PathRejection>,
) -> ApiResult<DeleteResult> {
    let Path(word_id) = word_id?;
    state.words.delete_word(user.user_id, word_id).await?;
    Ok(ApiResponse::ok(DeleteResult {
        id: word_id,
        deleted: true,
    }))
}

/// PATCH /api/v1/vocab/:word_id/status - manual override of `is_learned`
pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    word_id: Result<Path<WordId>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<StatusResult> {
    let Path(word_id) = word_id?;
    let Json(req) = payload?;
    state
        .words
        .set_status(user.user_id, word_id, req.is_learned)
        .await?;
    Ok(ApiResponse::ok(StatusResult {
        id: word_id,
        is_learned: req.is_learned,
    }))
}

/// POST /api/v1/vocab/:word_id/training
pub async fn record_training(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    word_id: Result<Path<WordId>, PathRejection>,
    payload: Result<Json<TrainingRequest>, JsonRejection>,
) -> ApiResult<Word> {
    let Path(word_id) = word_id?;
    let Json(req) = payload?;
    let word = state
        .words
        .record_training(user.user_id, word_id, req.training, req.result)
        .await?;
    Ok(ApiResponse::ok(word))
}
