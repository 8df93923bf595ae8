//! Configuration loading for the gateway.
//!
//! One TOML file read at startup; there is no runtime reconfiguration
//! surface. Credentials may be literal keys or `$ENV_VAR` references.

use crate::catalog::TierConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Upstream API keys in rotation order. `$NAME` entries are resolved
    /// from the environment at startup.
    #[serde(default)]
    pub credentials: Vec<String>,
    /// Priority tiers, best quality first. Empty means the built-in catalog.
    #[serde(default)]
    pub tiers: Vec<TierConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Static bearer key required on non-operational routes when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `HTTP-Referer` to identify the calling application.
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Sent as `X-Title`.
    #[serde(default = "default_title")]
    pub title: String,
    /// Per-attempt timeout for the completion call.
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            referer: default_referer(),
            title: default_title(),
            api_timeout_secs: default_api_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// TTL for cached answers.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// How long a recorded failure keeps counting against a model.
    #[serde(default = "default_decay_window_secs")]
    pub decay_window_secs: u64,
    /// Default attempt cap; unset means min(10, catalog size).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<usize>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            decay_window_secs: default_decay_window_secs(),
            max_attempts: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8790
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_referer() -> String {
    "https://www.nestline.homes".to_string()
}

fn default_title() -> String {
    "Nestline".to_string()
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_decay_window_secs() -> u64 {
    300
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Load the file if it exists; otherwise run on built-in defaults,
    /// which means the built-in catalog and an empty credential pool.
    pub fn from_path_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(
                "config {} not found; starting with built-in defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("config/default.toml")
    }

    /// Resolve `$ENV_VAR` credential references. Entries naming an unset
    /// variable are skipped with a warning; an empty result is allowed,
    /// and the gateway then answers in degraded mode only.
    pub fn resolved_credentials(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for entry in &self.credentials {
            if let Some(var) = entry.strip_prefix('$') {
                match std::env::var(var) {
                    Ok(value) if !value.trim().is_empty() => keys.push(value),
                    _ => warn!("credential env var {} is not set; skipping", var),
                }
            } else if !entry.trim().is_empty() {
                keys.push(entry.clone());
            }
        }
        keys
    }

    /// Per-entry credential report for `nestgate validate`. Makes no
    /// upstream calls.
    pub fn credential_report(&self) -> Vec<CredentialStatus> {
        self.credentials
            .iter()
            .map(|entry| {
                if let Some(var) = entry.strip_prefix('$') {
                    let set = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
                    CredentialStatus {
                        entry: entry.clone(),
                        ok: set,
                        detail: if set {
                            format!("{} set", var)
                        } else {
                            format!("{} not set", var)
                        },
                    }
                } else {
                    let ok = !entry.trim().is_empty();
                    CredentialStatus {
                        entry: redact(entry),
                        ok,
                        detail: if ok {
                            "API key configured".to_string()
                        } else {
                            "empty entry".to_string()
                        },
                    }
                }
            })
            .collect()
    }
}

/// Status of one configured credential entry.
#[derive(Debug)]
pub struct CredentialStatus {
    pub entry: String,
    pub ok: bool,
    pub detail: String,
}

/// Show only a prefix of literal keys in reports.
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{}…", prefix)
}
