use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{IdentityResolver, JwtIdentity};
use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::database::{DatabaseError, DatabaseManager};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::users::{MemoryUserStore, PgUserStore, UserService, UserStore};
use crate::words::{MemoryWordStore, PgWordStore, WordService, WordStore};

/// Shared services handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub words: WordService,
    pub users: UserService,
    pub identity: Arc<dyn IdentityResolver>,
    pub backend: StoreBackend,
}

impl AppState {
    pub fn new(
        word_store: Arc<dyn WordStore>,
        user_store: Arc<dyn UserStore>,
        identity: JwtIdentity,
        backend: StoreBackend,
    ) -> Self {
        Self {
            words: WordService::new(word_store),
            users: UserService::new(user_store, identity.clone()),
            identity: Arc::new(identity),
            backend,
        }
    }

    /// Both stores held in process memory
    pub fn in_memory(identity: JwtIdentity) -> Self {
        Self::new(
            Arc::new(MemoryWordStore::new()),
            Arc::new(MemoryUserStore::new()),
            identity,
            StoreBackend::Memory,
        )
    }

    /// Build the stores selected by `DATABASE_BACKEND`
    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        let identity = JwtIdentity::from_config(&config.security);

        match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on shutdown");
                Ok(Self::in_memory(identity))
            }
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                Ok(Self::new(
                    Arc::new(PgWordStore::new(pool.clone())),
                    Arc::new(PgUserStore::new(pool)),
                    identity,
                    StoreBackend::Postgres,
                ))
            }
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .fallback(public::root::not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, vocab};

    Router::new()
        .route("/api/v1/auth/whoami", get(auth::whoami))
        .route(
            "/api/v1/vocab",
            get(vocab::list).post(vocab::create).patch(vocab::patch_batch),
        )
        .route("/api/v1/vocab/:word_id", get(vocab::show).delete(vocab::delete))
        .route("/api/v1/vocab/:word_id/status", patch(vocab::set_status))
        .route("/api/v1/vocab/:word_id/training", post(vocab::record_training))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
