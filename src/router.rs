//! Failure-aware model selection.
//!
//! Keeps a sticky pointer to the last model that answered, a rotation
//! cursor over the catalog, and per-model failure counts that stop counting
//! once they age past the decay window. The counts are advisory: they steer
//! the scan order, they never gate correctness of an individual response.

use crate::catalog::ModelCatalog;
use crate::clock::Clock;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Failures tolerated on the sticky model before affinity is dropped.
const STICKY_FAILURE_LIMIT: u32 = 3;

/// Failures tolerated before rotation skips a model.
const ROTATION_FAILURE_LIMIT: u32 = 5;

struct RouterState {
    /// Most recently successful model; preferred while it stays healthy.
    sticky: String,
    /// Index of the last model handed out by rotation.
    cursor: usize,
    /// Failure timestamps per model, oldest first. A failure stops counting
    /// once it ages past the decay window; success clears the record.
    failures: HashMap<String, VecDeque<Instant>>,
}

pub struct ModelRouter {
    catalog: Arc<ModelCatalog>,
    clock: Arc<dyn Clock>,
    decay_window: Duration,
    state: Mutex<RouterState>,
}

impl ModelRouter {
    pub fn new(catalog: Arc<ModelCatalog>, clock: Arc<dyn Clock>, decay_window: Duration) -> Self {
        let sticky = catalog.first().to_string();
        Self {
            catalog,
            clock,
            decay_window,
            state: Mutex::new(RouterState {
                sticky,
                cursor: 0,
                failures: HashMap::new(),
            }),
        }
    }

    /// Pick the model for the next attempt.
    ///
    /// The sticky model wins while its live failure count stays under the
    /// affinity limit; otherwise rotation scans the catalog from just past
    /// the cursor for the first model under the rotation limit. `avoid`
    /// names the model that failed the previous attempt of the same
    /// request, so failover moves on instead of re-trying it immediately.
    ///
    /// When a full scan finds nothing eligible, every counter is zeroed and
    /// the first catalog entry is returned: with the whole pool saturated,
    /// retrying from the top beats locking ourselves out.
    pub fn select_next(&self, avoid: Option<&str>) -> String {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();

        let sticky = state.sticky.clone();
        let sticky_failures = live_failures(&mut state.failures, &sticky, now, self.decay_window);
        if sticky_failures < STICKY_FAILURE_LIMIT && avoid != Some(sticky.as_str()) {
            return sticky;
        }

        let models = self.catalog.ordered_models();
        let skip_avoided = models.len() > 1;
        for step in 1..=models.len() {
            let idx = (state.cursor + step) % models.len();
            let model = &models[idx];
            if skip_avoided && avoid == Some(model.as_str()) {
                continue;
            }
            if live_failures(&mut state.failures, model, now, self.decay_window)
                < ROTATION_FAILURE_LIMIT
            {
                let model = model.clone();
                state.cursor = idx;
                return model;
            }
        }

        warn!("every model in the catalog is saturated; resetting health state");
        state.failures.clear();
        state.cursor = 0;
        models[0].clone()
    }

    /// Clear the model's failure record and make it the sticky choice.
    pub fn record_success(&self, model: &str) {
        let mut state = self.state.lock().unwrap();
        state.failures.remove(model);
        if state.sticky != model {
            debug!("sticky model is now {}", model);
            state.sticky = model.to_string();
        }
    }

    /// Record one failure against the model. The entry ages out of the
    /// count after the decay window, modeling gradual recovery.
    pub fn record_failure(&self, model: &str) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        state
            .failures
            .entry(model.to_string())
            .or_default()
            .push_back(now);
        let count = live_failures(&mut state.failures, model, now, self.decay_window);
        debug!("{} failure count is {}", model, count);
    }

    /// Wipe all health state back to the freshly constructed shape.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.failures.clear();
        state.cursor = 0;
        state.sticky = self.catalog.first().to_string();
    }

    pub fn sticky_model(&self) -> String {
        self.state.lock().unwrap().sticky.clone()
    }

    /// Live failure counts per model; models with a clean record are omitted.
    pub fn failure_counts(&self) -> HashMap<String, u32> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();
        let models: Vec<String> = state.failures.keys().cloned().collect();
        models
            .into_iter()
            .filter_map(|model| {
                let count = live_failures(&mut state.failures, &model, now, self.decay_window);
                (count > 0).then_some((model, count))
            })
            .collect()
    }
}

/// Prune failures older than the decay window and return what remains.
fn live_failures(
    failures: &mut HashMap<String, VecDeque<Instant>>,
    model: &str,
    now: Instant,
    window: Duration,
) -> u32 {
    let Some(times) = failures.get_mut(model) else {
        return 0;
    };
    while times
        .front()
        .is_some_and(|t| now.duration_since(*t) >= window)
    {
        times.pop_front();
    }
    if times.is_empty() {
        failures.remove(model);
        return 0;
    }
    times.len() as u32
}
