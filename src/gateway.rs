//! The dispatch orchestrator.
//!
//! One long-lived [`ChatGateway`] per process owns the catalog, the
//! credential pool, the health state, and the cache. `send` runs the full
//! pipeline: cache short-circuit, then select → rotate credential → call →
//! classify, until an answer lands or the pool is exhausted.

use crate::cache::{CacheStats, ResponseCache};
use crate::catalog::ModelCatalog;
use crate::cli::AppConfig;
use crate::clock::{Clock, SystemClock};
use crate::credentials::CredentialPool;
use crate::fallback;
use crate::models::{ChatMessage, SendOptions, SendResult};
use crate::providers::error::ProviderError;
use crate::providers::{classify, ChatBackend, CompletionCall, FailureKind, OpenRouterBackend};
use crate::router::ModelRouter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Hard ceiling on dispatch attempts regardless of catalog size.
const MAX_ATTEMPT_CEILING: usize = 10;

/// Shown to the caller when every attempt failed for non-auth reasons.
const POOL_EXHAUSTED_MESSAGE: &str =
    "All chat backends are currently unavailable. Please try again in a moment.";

/// Admin snapshot of gateway state.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub models: usize,
    pub tiers: usize,
    pub credentials: usize,
    pub sticky_model: String,
    pub failure_counts: HashMap<String, u32>,
    pub cache: CacheStats,
}

pub struct ChatGateway {
    catalog: Arc<ModelCatalog>,
    pool: CredentialPool,
    router: ModelRouter,
    cache: ResponseCache,
    backend: Arc<dyn ChatBackend>,
    default_max_attempts: Option<usize>,
}

impl ChatGateway {
    /// Build a gateway with the real HTTP backend.
    pub fn new(config: &AppConfig) -> Self {
        let backend = Arc::new(OpenRouterBackend::from_config(&config.upstream));
        Self::with_backend(config, backend, Arc::new(SystemClock))
    }

    /// Build a gateway around an arbitrary backend and clock. This is the
    /// seam the scripted-backend tests go through.
    pub fn with_backend(
        config: &AppConfig,
        backend: Arc<dyn ChatBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = Arc::new(ModelCatalog::new(config.tiers.clone()));
        let pool = CredentialPool::new(config.resolved_credentials());
        let router = ModelRouter::new(
            catalog.clone(),
            clock.clone(),
            Duration::from_secs(config.gateway.decay_window_secs),
        );
        let cache = ResponseCache::new(Duration::from_secs(config.gateway.cache_ttl_secs), clock);
        Self {
            catalog,
            pool,
            router,
            cache,
            backend,
            default_max_attempts: config.gateway.max_attempts,
        }
    }

    /// Run one chat request through the pipeline.
    pub async fn send(
        &self,
        conversation: &[ChatMessage],
        system_prompt: &str,
        options: &SendOptions,
    ) -> SendResult {
        metrics::counter!("nestgate_requests_total").increment(1);

        let fingerprint = ResponseCache::fingerprint(system_prompt, conversation);
        if options.use_cache {
            if let Some(hit) = self.cache.get(&fingerprint) {
                debug!(fingerprint = %fingerprint, model = %hit.model, "serving cached answer");
                return SendResult::completed(hit.message, hit.model, true);
            }
        }

        let max_attempts = options
            .max_attempts
            .or(self.default_max_attempts)
            .unwrap_or_else(|| self.catalog.len().min(MAX_ATTEMPT_CEILING))
            .max(1);

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend_from_slice(conversation);

        let mut last_error: Option<(FailureKind, String)> = None;
        let mut last_failed: Option<String> = None;

        for attempt in 1..=max_attempts {
            let model = self.router.select_next(last_failed.as_deref());
            let credential = self.pool.next();
            let tier = self.catalog.tier_of(&model).unwrap_or("?");
            info!("[{}/{}] {:<12} → {}", attempt, max_attempts, tier, model);

            let call = CompletionCall {
                model: model.clone(),
                messages: messages.clone(),
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
            };

            match self.backend.complete(&call, &credential).await {
                Ok(message) => {
                    self.router.record_success(&model);
                    if options.use_cache {
                        self.cache
                            .put(fingerprint, message.clone(), model.clone());
                    }
                    metrics::counter!("nestgate_completions_total").increment(1);
                    return SendResult::completed(message, model, false);
                }
                Err(e) => {
                    let kind = classify(&e);
                    self.router.record_failure(&model);
                    self.note_failure(&model, &e, kind);
                    last_error = Some((kind, e.to_string()));
                    last_failed = Some(model);
                    if kind == FailureKind::Permanent {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some((FailureKind::Auth, detail)) => {
                info!("credential pool exhausted; answering in degraded mode");
                debug!("terminal auth error: {}", detail);
                metrics::counter!("nestgate_fallback_responses_total").increment(1);
                SendResult::degraded(fallback::respond(conversation))
            }
            Some((_, detail)) => {
                error!("no backend produced an answer: {}", detail);
                SendResult::failed(POOL_EXHAUSTED_MESSAGE.to_string(), Some(detail))
            }
            // max_attempts >= 1, so the loop always runs at least once.
            None => SendResult::failed(POOL_EXHAUSTED_MESSAGE.to_string(), None),
        }
    }

    fn note_failure(&self, model: &str, error: &ProviderError, kind: FailureKind) {
        if matches!(error, ProviderError::Api { status: 429, .. }) {
            warn!("{} rate limited, falling back", model);
            metrics::counter!("nestgate_ratelimit_hits_total").increment(1);
        } else {
            match kind {
                FailureKind::Transient => warn!("{} failed, trying next candidate: {}", model, error),
                FailureKind::Auth => warn!("credential rejected by {}: {}", model, error),
                FailureKind::Permanent => {
                    warn!("request rejected by {}, not retrying: {}", model, error)
                }
            }
        }
        metrics::counter!("nestgate_upstream_errors_total", "kind" => kind.as_str()).increment(1);
    }

    // ── Administrative surface ──

    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            models: self.catalog.len(),
            tiers: self.catalog.tier_count(),
            credentials: self.pool.len(),
            sticky_model: self.router.sticky_model(),
            failure_counts: self.router.failure_counts(),
            cache: self.cache.stats(),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("response cache cleared");
    }

    pub fn reset_health(&self) {
        self.router.reset();
        info!("health state reset");
    }
}
