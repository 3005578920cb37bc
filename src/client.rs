use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::Duration;
use tracing::debug;

/// Remote conversational-AI capability, treated as an opaque async function.
///
/// Implementations must be thread-safe so calls can be spawned onto the
/// runtime while earlier calls are still in flight.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send a prompt to the remote endpoint and return its structured reply.
    async fn chat(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChatReply>;
}

/// Success shape returned by the Puter chat endpoint:
/// `{ "message": { "content": [ { "text": ... } ] } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub message: Option<ReplyMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Extract the assistant text from a reply.
///
/// Only the first content part is read. A reply that parses but carries no
/// text (missing message, empty content list, empty string) yields `None`.
pub fn reply_text(reply: &ChatReply) -> Option<String> {
    reply
        .message
        .as_ref()?
        .content
        .first()?
        .text
        .clone()
        .filter(|text| !text.is_empty())
}

/// HTTP client for the Puter chat endpoint
#[derive(Clone)]
pub struct PuterClient {
    config: Config,
    client: reqwest::Client,
}

impl PuterClient {
    pub fn new(config: Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        // No timeout unless one is configured; a pending call always runs to
        // completion otherwise.
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ChatApi for PuterClient {
    async fn chat(
        &self,
        prompt: &str,
        model: &str,
        system_prompt: Option<&str>,
    ) -> Result<ChatReply> {
        let url = format!("{}/ai/chat", self.config.base_url.trim_end_matches('/'));

        let mut payload = serde_json::json!({
            "message": prompt,
            "model": model,
        });
        if let Some(system_prompt) = system_prompt {
            payload["system_prompt"] = serde_json::json!(system_prompt);
        }

        debug!(%url, model, "sending chat request");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(token) = self.config.api_token() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Puter API error: {} {}", status, error_text));
        }

        let reply = response
            .json::<ChatReply>()
            .await
            .context("Malformed reply from Puter API")?;

        Ok(reply)
    }
}
