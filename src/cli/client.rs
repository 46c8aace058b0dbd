use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::cli::config::EnvironmentConfig;

/// Thin JSON client for the vocab API that unwraps the response envelope
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            token,
        })
    }

    pub fn from_env(env: &EnvironmentConfig) -> anyhow::Result<Self> {
        Self::new(env.server_url(), env.token.clone())
    }

    /// Fails early with a hint when no login token is stored
    pub fn authenticated(env: &EnvironmentConfig) -> anyhow::Result<Self> {
        if env.token.is_none() {
            anyhow::bail!("Not logged in. Run `vocab auth login <email>` first");
        }
        Self::from_env(env)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body.get("data").cloned().unwrap_or(body));
        }

        tracing::debug!("Request failed with {}: {}", status, body);
        Err(api_error(status.as_u16(), &body))
    }
}

/// Build a readable error from an `{ error, message, code }` body
fn api_error(status: u16, body: &Value) -> anyhow::Error {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    let code = body.get("code").and_then(Value::as_str).unwrap_or("HTTP_ERROR");

    let mut text = format!("{} ({} {})", message, status, code);
    if let Some(fields) = body.get("field_errors").and_then(Value::as_object) {
        for (field, reason) in fields {
            text.push_str(&format!("\n  {}: {}", field, reason.as_str().unwrap_or_default()));
        }
    }
    anyhow::anyhow!(text)
}
