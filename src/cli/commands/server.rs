use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_environment_config, normalize_server_url, save_environment_config};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Switch to server (persistent selection)")]
    Use {
        #[arg(help = "Server base URL, e.g. http://localhost:9001")]
        url: String,
    },

    #[command(about = "Show currently selected server")]
    Current,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,

    #[command(about = "Show server information from API root endpoint")]
    Info,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env = load_environment_config()?;

    match cmd {
        ServerCommands::Use { url } => {
            let url = normalize_server_url(&url)?;
            if env.server_url.as_deref() != Some(url.as_str()) {
                // tokens are only valid on the server that issued them
                env.clear_session();
            }
            env.server_url = Some(url.clone());
            save_environment_config(&env)?;

            output_success(
                output_format,
                &format!("Switched to server '{}'", url),
                Some(json!({ "server_url": url })),
            )
        }
        ServerCommands::Current => output_value(
            output_format,
            &json!({ "server_url": env.server_url(), "email": env.email }),
            |_| {
                println!("Current server: {}", env.server_url());
                if let Some(email) = &env.email {
                    println!("Logged in as: {}", email);
                }
            },
        ),
        ServerCommands::Health => {
            let health = ApiClient::from_env(&env)?.get("/health").await?;
            output_value(output_format, &health, |health| {
                println!(
                    "{}: {} (store: {})",
                    env.server_url(),
                    health["status"].as_str().unwrap_or("unknown"),
                    health["store"].as_str().unwrap_or("unknown"),
                );
            })
        }
        ServerCommands::Info => {
            let info = ApiClient::from_env(&env)?.get("/").await?;
            output_value(output_format, &info, |info| {
                println!(
                    "{} {}",
                    info["name"].as_str().unwrap_or_default(),
                    info["version"].as_str().unwrap_or_default()
                );
                if let Some(description) = info["description"].as_str() {
                    println!("{}", description);
                }
            })
        }
    }
}
