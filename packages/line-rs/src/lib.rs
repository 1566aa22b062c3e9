//! Minimal LINE Messaging API client.
//!
//! Only the push endpoint is supported: one request, one or more messages,
//! one recipient.
//!
//! # Example
//!
//! ```rust,ignore
//! use line::{LineOptions, LineService};
//!
//! let service = LineService::new(LineOptions::new("channel-access-token"))?;
//! service.push_text("U0123456789abcdef", "hello").await?;
//! ```

pub mod error;
pub mod models;

pub use error::{LineError, Result};
pub use models::{ApiErrorBody, Message, PushRequest};

use std::time::Duration;
use tracing::{debug, error};

pub const PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct LineOptions {
    pub channel_access_token: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl LineOptions {
    pub fn new(channel_access_token: impl Into<String>) -> Self {
        Self {
            channel_access_token: channel_access_token.into(),
            endpoint: PUSH_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the push endpoint (useful against a local stub server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LineService {
    client: reqwest::Client,
    options: LineOptions,
}

impl LineService {
    pub fn new(options: LineOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;

        Ok(Self { client, options })
    }

    /// Push a single text message to `to`.
    pub async fn push_text(&self, to: &str, text: &str) -> Result<()> {
        self.push(&PushRequest::text(to, text)).await
    }

    pub async fn push(&self, request: &PushRequest) -> Result<()> {
        debug!(
            to = %request.to,
            messages = request.messages.len(),
            "Sending LINE push"
        );

        let response = self
            .client
            .post(&self.options.endpoint)
            .bearer_auth(&self.options.channel_access_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "LINE push failed");
            return Err(LineError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(())
    }
}

/// Prefer the API's `message` field; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.to_string(),
    }
}
