//! Response cache for repeated widget questions.
//!
//! Entries are keyed by a SHA-256 fingerprint of the system prompt and the
//! final conversation entry, with a fixed TTL. Expiry is checked at read
//! time; there is no background sweeper. Staleness is tolerable here, so a
//! plain mutex-guarded map with last-write-wins semantics is enough.

use crate::clock::Clock;
use crate::models::ChatMessage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Hex characters of the digest kept as the cache key.
const FINGERPRINT_LEN: usize = 16;

/// A previously produced answer.
#[derive(Debug, Clone)]
pub struct CachedAnswer {
    pub message: String,
    pub model: String,
    created_at: Instant,
}

/// Cache counters, reported on the admin status surface.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

pub struct ResponseCache {
    entries: Mutex<HashMap<String, CachedAnswer>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fingerprint of a request: a short digest of the system prompt and
    /// the final conversation entry. Earlier turns are deliberately
    /// ignored, so two conversations ending in the same question share an
    /// entry; acceptable for a widget that mostly answers FAQs.
    pub fn fingerprint(system_prompt: &str, conversation: &[ChatMessage]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(system_prompt.as_bytes());
        hasher.update(b"|");
        if let Some(last) = conversation.last() {
            hasher.update(last.role.as_bytes());
            hasher.update(b"|");
            hasher.update(last.content.as_bytes());
        }
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(FINGERPRINT_LEN);
        digest
    }

    /// Look up a live entry. Expired entries are ignored, not removed.
    pub fn get(&self, fingerprint: &str) -> Option<CachedAnswer> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap();
        match entries.get(fingerprint) {
            Some(entry) if now.duration_since(entry.created_at) <= self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("nestgate_cache_hits_total").increment(1);
                Some(entry.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("nestgate_cache_misses_total").increment(1);
                None
            }
        }
    }

    /// Store an answer, superseding any entry under the same fingerprint.
    pub fn put(&self, fingerprint: String, message: String, model: String) {
        let entry = CachedAnswer {
            message,
            model,
            created_at: self.clock.now(),
        };
        self.entries.lock().unwrap().insert(fingerprint, entry);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().unwrap().len() as u64,
        }
    }
}
