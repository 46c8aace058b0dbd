// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::{DatabaseError, StoreError};
use crate::users::UserError;
use crate::words::{ValidationError, VocabError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

pub const FORBIDDEN_WORD_MESSAGE: &str = "You are not allowed to modify this word";
const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while processing your request";

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        let field_errors = err.field().map(|field| {
            let mut field_errors = HashMap::new();
            field_errors.insert(field.to_string(), message.clone());
            field_errors
        });
        ApiError::validation_error(message, field_errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found("Record not found"),
            StoreError::Conflict(msg) => {
                tracing::info!("Store conflict: {}", msg);
                ApiError::conflict("The record conflicts with an existing one")
            }
            StoreError::Database(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database error: {}", msg);
                ApiError::internal_server_error(GENERIC_FAILURE_MESSAGE)
            }
        }
    }
}

impl From<VocabError> for ApiError {
    fn from(err: VocabError) -> Self {
        match err {
            VocabError::Validation(e) => e.into(),
            VocabError::Forbidden(word_id) => {
                tracing::debug!("Rejected access to word {}", word_id);
                ApiError::forbidden(FORBIDDEN_WORD_MESSAGE)
            }
            VocabError::UpdateFailed { word_id, source }
            | VocabError::StatusUpdateFailed { word_id, source } => match source {
                StoreError::Conflict(msg) => {
                    tracing::info!("Update of word {} conflicts: {}", word_id, msg);
                    ApiError::conflict("A word with this text already exists")
                }
                StoreError::Database(msg) => {
                    tracing::error!("Failed to update word {}: {}", word_id, msg);
                    ApiError::internal_server_error("Failed to update word")
                }
                StoreError::NotFound => ApiError::forbidden(FORBIDDEN_WORD_MESSAGE),
            },
            VocabError::Storage(StoreError::Conflict(msg)) => {
                tracing::info!("Word conflict: {}", msg);
                ApiError::conflict("A word with this text already exists")
            }
            VocabError::Storage(other) => other.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation { field, message } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(field.to_string(), message.clone());
                ApiError::validation_error(message, Some(field_errors))
            }
            UserError::EmailTaken => ApiError::conflict("Email is already registered"),
            UserError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            UserError::NotFound(_) => ApiError::unauthorized("User no longer exists"),
            UserError::Auth(e) => e.into(),
            UserError::Storage(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::MalformedHeader | AuthError::InvalidToken(_) => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::TokenGeneration(_) | AuthError::InvalidSecret | AuthError::PasswordHash(_) => {
                tracing::error!("Authentication failure: {}", err);
                ApiError::internal_server_error(GENERIC_FAILURE_MESSAGE)
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(_) | DatabaseError::Sqlx(_) => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Bootstrap(msg) => {
                tracing::error!("Schema bootstrap error: {}", msg);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::ValueKind;

    #[test]
    fn validation_error_carries_field() {
        let err: ApiError = VocabError::from(ValidationError::InvalidValueType {
            field: "cards".to_string(),
            expected: ValueKind::Boolean,
        })
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], true);
        assert!(body["field_errors"]["cards"].is_string());
    }

    #[test]
    fn no_updates_has_no_field_errors() {
        let body = ApiError::from(ValidationError::NoUpdatesProvided).to_json();
        assert_eq!(body["message"], "No updates provided");
        assert!(body.get("field_errors").is_none());
    }

    #[test]
    fn forbidden_is_generic() {
        let err: ApiError = VocabError::Forbidden(99).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), FORBIDDEN_WORD_MESSAGE);
    }

    #[test]
    fn storage_details_are_hidden() {
        let err: ApiError = VocabError::UpdateFailed {
            word_id: 1,
            source: StoreError::Database("relation words does not exist".to_string()),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("relation"));
    }

    #[test]
    fn conflict_maps_to_409() {
        let err: ApiError = VocabError::Storage(StoreError::Conflict("dup".to_string())).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let err: ApiError = UserError::InvalidCredentials.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }
}
