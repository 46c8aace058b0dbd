use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vocab_api::app::{self, AppState};
use vocab_api::config::{self, StoreBackend};
use vocab_api::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "vocab-api")]
#[command(about = "Vocabulary API server")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides VOCAB_API_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create database tables and indexes")]
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    init_tracing(config.api.enable_request_logging);

    config.validate()?;
    tracing::info!("Starting vocab-api in {:?} mode", config.environment);

    match Args::parse().command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(port).await,
        Command::InitDb => init_db().await,
    }
}

fn init_tracing(request_logging: bool) {
    let default_filter = if request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    let state = AppState::from_config(config)
        .await
        .context("failed to initialize stores")?;
    let app = app::router(state, config);

    let port = port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("vocab-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn init_db() -> anyhow::Result<()> {
    let config = config::config();
    if config.database.backend == StoreBackend::Memory {
        anyhow::bail!("init-db requires DATABASE_BACKEND=postgres");
    }

    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::health_check(&pool).await?;
    DatabaseManager::bootstrap(&pool).await?;

    println!("Database schema is ready");
    Ok(())
}
