use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Bootstrap DDL, safe to run repeatedly
const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Schema bootstrap failed: {0}")]
    Bootstrap(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool setup and schema bootstrap for the Postgres backend
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool sized and timed out according to config
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );
        Ok(pool)
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn bootstrap(pool: &PgPool) -> Result<(), DatabaseError> {
        let mut tx = pool.begin().await?;
        for statement in Self::schema_statements() {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DatabaseError::Bootstrap(format!("{}: {}", statement, e)))?;
        }
        tx.commit().await?;

        info!("Database schema is up to date");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Split the bootstrap script into individual statements, dropping
    /// comment lines and blanks
    fn schema_statements() -> Vec<&'static str> {
        SCHEMA_SQL
            .split(';')
            .map(str::trim)
            .filter(|statement| {
                statement
                    .lines()
                    .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
            })
            .collect()
    }
}
