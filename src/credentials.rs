//! Round-robin pool of upstream API credentials.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out one credential per dispatch attempt, cycling through the
/// configured set. The cursor advances on every call, so a request that
/// retries across models consumes several credentials.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Next credential in rotation. With an empty pool this returns the
    /// empty-string sentinel; upstream will reject it with an auth error,
    /// which is exactly what routes the request into degraded mode.
    pub fn next(&self) -> String {
        if self.keys.is_empty() {
            return String::new();
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        self.keys[idx].clone()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
