//! Wire types shared by the gateway, the HTTP surface, and the chat widget.

use serde::{Deserialize, Serialize};

/// One turn of a conversation, OpenAI chat-completions wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Options recognized on a send call. Field names follow the widget's JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    /// Cap on dispatch attempts. Unset means min(10, catalog size).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            use_cache: default_use_cache(),
            max_attempts: None,
        }
    }
}

fn default_max_tokens() -> u32 {
    400
}

fn default_temperature() -> f32 {
    0.6
}

fn default_top_p() -> f32 {
    0.9
}

fn default_use_cache() -> bool {
    true
}

/// Inbound body for `POST /v1/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// System prompt override; the built-in marketplace prompt otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub options: SendOptions,
}

/// What the caller gets back from a send. Absent fields are omitted on the
/// wire so the widget can key off plain `success`/`cached`/`fallback` flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SendResult {
    /// A completion produced by an upstream model (fresh or cached).
    pub fn completed(message: String, model: String, cached: bool) -> Self {
        Self {
            success: true,
            message: Some(message),
            model: Some(model),
            cached: Some(cached),
            fallback: None,
            error: None,
            details: None,
        }
    }

    /// A canned answer from the degraded responder. Still a success: the
    /// widget shows the message like any other.
    pub fn degraded(message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            model: None,
            cached: None,
            fallback: Some(true),
            error: None,
            details: None,
        }
    }

    /// Every attempt consumed without an answer.
    pub fn failed(error: String, details: Option<String>) -> Self {
        Self {
            success: false,
            message: None,
            model: None,
            cached: None,
            fallback: None,
            error: Some(error),
            details,
        }
    }
}
