//! HTTP surface for the marketplace application.
//!
//! The widget posts conversations to `/v1/chat`; the admin console uses the
//! `/admin` routes. `/health` and `/metrics` stay open for probes and
//! scraping even when an API key is configured.

use crate::cli::AppConfig;
use crate::gateway::ChatGateway;
use crate::models::ChatRequest;
use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// System prompt used when the widget does not supply one.
const DEFAULT_SYSTEM_PROMPT: &str = "You are the Nestline assistant, helping visitors of a \
real-estate marketplace browse listings, understand neighborhoods, and estimate financing. \
Keep answers short, factual, and friendly.";

/// Shared application state.
pub struct AppState {
    pub gateway: ChatGateway,
    pub api_key: Option<String>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Constant-time string comparison to avoid timing side channels on the key.
fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Checks the static bearer key on non-operational routes. With no key
/// configured, all requests pass.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if matches!(path, "/health" | "/metrics") {
        return next.run(request).await;
    }

    let Some(ref expected) = state.api_key else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or_else(|| {
            request
                .headers()
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
        })
        .is_some_and(|key| constant_time_eq(key, expected));

    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid or missing API key"})),
        )
            .into_response()
    }
}

/// Request-id + latency logging for every route.
async fn request_log_middleware(request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        request_id = %request_id,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{} {}",
        method,
        path
    );
    response
}

async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.messages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "messages must not be empty"})),
        )
            .into_response();
    }

    let system = request
        .system
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let result = state
        .gateway
        .send(&request.messages, system, &request.options)
        .await;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(result)).into_response()
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics_handle.render()
}

async fn admin_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.gateway.status())
}

async fn admin_clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.gateway.clear_cache();
    Json(json!({"cleared": true}))
}

async fn admin_reset_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.gateway.reset_health();
    Json(json!({"reset": true}))
}

/// Assemble the route table and middleware stack.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat", post(handle_chat))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route("/admin/status", get(admin_status))
        .route("/admin/cache/clear", post(admin_clear_cache))
        .route("/admin/health/reset", post(admin_reset_health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn(request_log_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start serving and block until ctrl-c.
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let gateway = ChatGateway::new(&config);
    let state = Arc::new(AppState {
        gateway,
        api_key: config.server.api_key.clone(),
        metrics_handle,
    });

    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
