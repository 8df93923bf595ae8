//! Shared fixtures for the nestgate test suites.

use async_trait::async_trait;
use nestgate::catalog::TierConfig;
use nestgate::cli::AppConfig;
use nestgate::models::ChatMessage;
use nestgate::providers::error::ProviderError;
use nestgate::providers::{ChatBackend, CompletionCall};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Catalog [alpha, beta | gamma]: two tiers, three models.
pub fn test_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            name: "primary".to_string(),
            models: vec!["alpha".to_string(), "beta".to_string()],
        },
        TierConfig {
            name: "backup".to_string(),
            models: vec!["gamma".to_string()],
        },
    ]
}

/// Config with the test catalog and credentials [k1, k2].
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.credentials = vec!["k1".to_string(), "k2".to_string()];
    config.tiers = test_tiers();
    config
}

/// Single-turn conversation from the widget.
pub fn user_conversation(text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(text)]
}

enum Script {
    Queue(VecDeque<Result<String, ProviderError>>),
    RepeatApi { status: u16, message: String },
}

/// In-memory backend that replays a script and records every call.
pub struct ScriptedBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(Script::Queue(script.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that answers every call with the same API error.
    pub fn repeating_api_error(status: u16, message: &str) -> Self {
        Self {
            script: Mutex::new(Script::RepeatApi {
                status,
                message: message.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(model, credential)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        call: &CompletionCall,
        credential: &str,
    ) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((call.model.clone(), credential.to_string()));
        match &mut *self.script.lock().unwrap() {
            Script::Queue(queue) => queue.pop_front().unwrap_or_else(|| {
                Err(ProviderError::Api {
                    status: 500,
                    message: "script exhausted".to_string(),
                })
            }),
            Script::RepeatApi { status, message } => Err(ProviderError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}
