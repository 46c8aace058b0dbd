use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::model::{normalize_email, validate_email, validate_password, NewUser, UserProfile};
use super::store::UserStore;
use crate::auth::{self, AuthError, JwtIdentity};
use crate::database::StoreError;
use crate::words::UserId;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Email is already registered")]
    EmailTaken,

    /// Same error for an unknown email and a wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User {0} not found")]
    NotFound(UserId),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl UserError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        UserError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Token handed out by a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Registration, login and profile lookup
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    identity: JwtIdentity,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, identity: JwtIdentity) -> Self {
        Self { store, identity }
    }

    pub fn identity(&self) -> &JwtIdentity {
        &self.identity
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, UserError> {
        let username = username.trim();
        let email = normalize_email(email);

        if username.is_empty() {
            return Err(UserError::validation("username", "Username cannot be empty"));
        }
        validate_email(&email).map_err(|msg| UserError::validation("email", msg))?;
        validate_password(password).map_err(|msg| UserError::validation("password", msg))?;

        let password = password.to_string();
        let password_hash = off_runtime(move || auth::hash_password(&password)).await?;
        let user = self
            .store
            .insert(NewUser {
                username: username.to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => UserError::EmailTaken,
                other => UserError::Storage(other),
            })?;

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginToken, UserError> {
        let email = normalize_email(email);

        let user = match self.store.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("Login attempt for unknown email {}", email);
                return Err(UserError::InvalidCredentials);
            }
        };

        let password = password.to_string();
        let stored_hash = user.password_hash.clone();
        if !off_runtime(move || auth::verify_password(&password, &stored_hash)).await? {
            warn!("Wrong password for user {}", user.id);
            return Err(UserError::InvalidCredentials);
        }

        let token = self.identity.issue(user.id)?;
        Ok(LoginToken {
            token,
            token_type: "Bearer",
            expires_in: self.identity.expires_in(),
        })
    }

    pub async fn whoami(&self, user_id: UserId) -> Result<UserProfile, UserError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or(UserError::NotFound(user_id))
    }
}

/// Argon2 is CPU-bound; keep it off the async workers
async fn off_runtime<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
}
