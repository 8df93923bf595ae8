//! Maps a failed attempt onto what the dispatch loop should do next.
//!
//! The source of truth for retry-vs-abort decisions lives here, in one pure
//! function, so the policy is testable without any network plumbing.

use super::error::ProviderError;

/// How the dispatch loop reacts to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Backend-specific trouble; another model may well succeed.
    Transient,
    /// The request itself was rejected; other backends will reject it too.
    Permanent,
    /// Credential rejected. Rotation onto another credential may still
    /// work; if it never does, the degraded responder takes over.
    Auth,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
            FailureKind::Auth => "auth",
        }
    }
}

/// Status codes retried against another model.
const TRANSIENT_STATUSES: [u16; 4] = [429, 403, 502, 503];

/// Message fragments that mark a throttled or overloaded backend,
/// matched case-insensitively.
const TRANSIENT_PHRASES: [&str; 7] = [
    "rate limit",
    "too many requests",
    "quota exceeded",
    "model overloaded",
    "capacity",
    "temporarily unavailable",
    "unavailable",
];

pub fn classify(error: &ProviderError) -> FailureKind {
    match error {
        ProviderError::Api { status, message } => classify_api(*status, message),
        // Network errors and timeouts: the next attempt may land fine.
        ProviderError::Http(_) => FailureKind::Transient,
        // Garbled or empty bodies come from overloaded backends in practice.
        ProviderError::Decode(_) | ProviderError::EmptyCompletion => FailureKind::Transient,
    }
}

fn classify_api(status: u16, message: &str) -> FailureKind {
    let lowered = message.to_lowercase();
    if status == 401 || lowered.contains("401") || lowered.contains("unauthorized") {
        return FailureKind::Auth;
    }
    if TRANSIENT_STATUSES.contains(&status) {
        return FailureKind::Transient;
    }
    if TRANSIENT_PHRASES.iter().any(|p| lowered.contains(p)) {
        return FailureKind::Transient;
    }
    // Remaining 4xx means the request shape was rejected; trying the same
    // request against another backend is presumed futile.
    if (400..500).contains(&status) {
        return FailureKind::Permanent;
    }
    FailureKind::Transient
}
