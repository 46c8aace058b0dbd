#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Server process running the in-memory backend, killed on drop
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_vocab-api"))
            .arg("serve")
            .env("APP_ENV", "development")
            .env("DATABASE_BACKEND", "memory")
            .env("VOCAB_API_PORT", port.to_string())
            .env("SECURITY_JWT_SECRET", "integration-test-secret")
            .env("RUST_LOG", "vocab_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register and log in, returning the bearer token
    pub async fn sign_in(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({"username": "tester", "email": email, "password": "secret1"}))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({"email": email, "password": "secret1"}))
            .send()
            .await?
            .json()
            .await?;

        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response without token")
    }

    /// Create a word and return its id
    pub async fn add_word(&self, token: &str, word: &str) -> Result<i64> {
        let body: Value = self
            .client
            .post(self.url("/api/v1/vocab"))
            .bearer_auth(token)
            .json(&json!({"word": word, "definition": "test definition"}))
            .send()
            .await?
            .json()
            .await?;

        body["data"]["id"].as_i64().context("create response without id")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
