use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_environment_config, save_environment_config};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Login and store the token for later commands")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Forget the stored token")]
    Logout,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env = load_environment_config()?;

    match cmd {
        AuthCommands::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let profile = ApiClient::from_env(&env)?
                .post(
                    "/api/v1/auth/register",
                    &json!({ "username": username, "email": email, "password": password }),
                )
                .await?;

            output_success(
                output_format,
                &format!("Registered '{}'", profile["email"].as_str().unwrap_or(&email)),
                Some(profile),
            )
        }
        AuthCommands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let login = ApiClient::from_env(&env)?
                .post(
                    "/api/v1/auth/login",
                    &json!({ "email": email, "password": password }),
                )
                .await?;

            let token = login["token"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Server response did not include a token"))?;
            env.set_session(email.trim().to_string(), token.to_string());
            save_environment_config(&env)?;

            output_success(
                output_format,
                &format!("Logged in as {}", email.trim()),
                Some(json!({ "expires_in": login["expires_in"] })),
            )
        }
        AuthCommands::Whoami => {
            let profile = ApiClient::authenticated(&env)?.get("/api/v1/auth/whoami").await?;
            output_value(output_format, &profile, |profile| {
                println!(
                    "{} <{}> (id {})",
                    profile["username"].as_str().unwrap_or_default(),
                    profile["email"].as_str().unwrap_or_default(),
                    profile["id"]
                );
            })
        }
        AuthCommands::Logout => {
            env.clear_session();
            save_environment_config(&env)?;
            output_success(output_format, "Logged out", None)
        }
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
