//! OpenRouter-compatible chat-completions backend.

use super::error::ProviderError;
use super::{build_upstream_client, ChatBackend, CompletionCall};
use crate::cli::UpstreamConfig;
use crate::models::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct OpenRouterBackend {
    client: reqwest::Client,
    base_url: String,
    /// Sent as `HTTP-Referer`; identifies the marketplace to the upstream.
    referer: String,
    /// Sent as `X-Title`.
    title: String,
    api_timeout: Duration,
}

/// Wire shape of one completion request.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterBackend {
    pub fn new(
        base_url: String,
        referer: String,
        title: String,
        api_timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            client: build_upstream_client(connect_timeout),
            base_url,
            referer,
            title,
            api_timeout,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.referer.clone(),
            config.title.clone(),
            Duration::from_secs(config.api_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    /// Fold a non-success status and its body into an `Api` error.
    async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Api { status, message });
        }
        Ok(response)
    }

    fn extract_message(decoded: CompletionResponse) -> Result<String, ProviderError> {
        let message = decoded
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if message.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(message)
    }
}

#[async_trait]
impl ChatBackend for OpenRouterBackend {
    async fn complete(
        &self,
        call: &CompletionCall,
        credential: &str,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &call.model,
            messages: &call.messages,
            max_tokens: call.max_tokens,
            temperature: call.temperature,
            top_p: call.top_p,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", credential))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .timeout(self.api_timeout)
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!("completion response body: {}", text);

        let decoded: CompletionResponse = serde_json::from_str(&text)?;
        Self::extract_message(decoded)
    }
}
