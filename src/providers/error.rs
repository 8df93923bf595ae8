use thiserror::Error;

/// What a single upstream completion attempt can fail with.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure: connect, TLS, or the per-attempt timeout.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A body arrived but could not be decoded.
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx response without a usable assistant message.
    #[error("upstream returned an empty completion")]
    EmptyCompletion,
}
