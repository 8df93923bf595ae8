//! Upstream chat-completion backends.
//!
//! The dispatch loop talks to upstream through the [`ChatBackend`] trait so
//! the whole failover path is exercisable with a scripted in-memory backend.

pub mod classify;
pub mod error;
pub mod openrouter;

use crate::models::ChatMessage;
use async_trait::async_trait;
use error::ProviderError;
use reqwest::Client;
use std::time::Duration;

/// One fully resolved upstream attempt.
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub model: String,
    /// System entry first, then the conversation in order.
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// A chat-completion backend. One call is one attempt with one rotated
/// credential; the per-attempt timeout is the implementation's concern.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue the attempt and return the assistant message text.
    async fn complete(
        &self,
        call: &CompletionCall,
        credential: &str,
    ) -> Result<String, ProviderError>;
}

/// Build a `reqwest::Client` tuned for repeated upstream calls: fail-fast
/// connects, TCP_NODELAY, and a warm connection pool.
pub fn build_upstream_client(connect_timeout: Duration) -> Client {
    Client::builder()
        .tcp_nodelay(true)
        .connect_timeout(connect_timeout)
        .pool_max_idle_per_host(20)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub use classify::{classify, FailureKind};
pub use openrouter::OpenRouterBackend;
