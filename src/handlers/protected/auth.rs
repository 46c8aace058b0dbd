use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::users::UserProfile;

/// GET /api/v1/auth/whoami
pub async fn whoami(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let profile = state.users.whoami(user.user_id).await?;
    Ok(ApiResponse::ok(profile))
}
