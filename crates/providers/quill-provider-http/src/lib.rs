//! HTTP transport for the Quill client
//!
//! Talks to the generation service's `/api/generate` event stream plus its
//! `/api/history` and `/health` endpoints.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use futures_util::StreamExt;
use quill_core::{
    ByteStream, ClientConfig, GenerateRequest, GeneratedContent, GenerationTransport,
    HealthStatus, QuillError, Result,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Streaming generation endpoint
pub const GENERATE_PATH: &str = "/api/generate";

/// Generation history endpoint
pub const HISTORY_PATH: &str = "/api/history";

/// Health check endpoint
pub const HEALTH_PATH: &str = "/health";

/// Error payload the service sends with non-success statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// reqwest-backed [`GenerationTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a client for `config.api_url`
    ///
    /// Only connecting is timed out; a response stream may run indefinitely.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(300))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Use an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Content the service generated recently, newest first
    pub async fn history(&self) -> Result<Vec<GeneratedContent>> {
        let resp = self.client.get(self.url(HISTORY_PATH)).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let entries: Vec<GeneratedContent> = resp.json().await?;
        tracing::debug!(entries = entries.len(), "fetched generation history");
        Ok(entries)
    }

    /// Service health
    ///
    /// An unhealthy service answers with a 5xx status and a health body; that
    /// body is returned as `Ok` so callers can show the reason.
    pub async fn health(&self) -> Result<HealthStatus> {
        let resp = self.client.get(self.url(HEALTH_PATH)).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        match serde_json::from_str::<HealthStatus>(&text) {
            Ok(health) if status.is_success() || status.is_server_error() => Ok(health),
            Ok(_) => Err(QuillError::status(status.as_u16(), error_message(&text))),
            Err(_) if !status.is_success() => {
                Err(QuillError::status(status.as_u16(), error_message(&text)))
            }
            Err(e) => Err(QuillError::Serialization(e)),
        }
    }
}

#[async_trait]
impl GenerationTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn open_stream(&self, request: &GenerateRequest) -> Result<ByteStream> {
        let url = self.url(GENERATE_PATH);
        tracing::debug!(url = %url, agents = request.selected_agents.len(), "opening generation stream");

        let resp = self
            .client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            tracing::warn!(error = %err, "generation request rejected");
            return Err(err);
        }

        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| QuillError::stream(e.to_string())))
            .boxed())
    }
}

async fn error_from_response(resp: Response) -> QuillError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = error_message(&text);
    if message.is_empty() {
        QuillError::status(status.as_u16(), default_reason(status))
    } else {
        QuillError::status(status.as_u16(), message)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().to_string())
}

fn default_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_default()
}
