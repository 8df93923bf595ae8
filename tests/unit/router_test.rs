//! Selection behavior of the model router under accumulating failures.

use crate::fixtures::test_tiers;
use nestgate::catalog::ModelCatalog;
use nestgate::clock::ManualClock;
use nestgate::router::ModelRouter;
use std::sync::Arc;
use std::time::Duration;

const DECAY_WINDOW: Duration = Duration::from_secs(300);

fn test_router(clock: Arc<ManualClock>) -> ModelRouter {
    let catalog = Arc::new(ModelCatalog::new(test_tiers()));
    ModelRouter::new(catalog, clock, DECAY_WINDOW)
}

#[test]
fn test_rate_limited_model_is_excluded_after_five_failures() {
    let router = test_router(Arc::new(ManualClock::new()));

    // beta keeps answering 429; five recorded failures take it out of
    // rotation until the count decays.
    for _ in 0..5 {
        router.record_failure("beta");
    }
    for _ in 0..4 {
        assert_ne!(router.select_next(Some("alpha")), "beta");
    }
}

#[test]
fn test_excluded_model_returns_after_decay() {
    let clock = Arc::new(ManualClock::new());
    let router = test_router(clock.clone());

    for _ in 0..5 {
        router.record_failure("beta");
    }
    assert_eq!(router.select_next(Some("alpha")), "gamma");

    clock.advance(Duration::from_secs(301));
    assert_eq!(router.select_next(Some("alpha")), "beta");
}

#[test]
fn test_simultaneous_saturation_triggers_full_reset() {
    let router = test_router(Arc::new(ManualClock::new()));

    for model in ["alpha", "beta", "gamma"] {
        for _ in 0..5 {
            router.record_failure(model);
        }
    }

    // No eligible model left: counters reset, first catalog entry returned.
    assert_eq!(router.select_next(None), "alpha");
    assert!(router.failure_counts().is_empty());
}

#[test]
fn test_sticky_model_preferred_over_rotation_cursor() {
    let router = test_router(Arc::new(ManualClock::new()));

    router.record_failure("alpha");
    // Rotation moves the cursor onto beta for this request...
    assert_eq!(router.select_next(Some("alpha")), "beta");
    // ...but a fresh request still prefers the sticky model at one failure.
    assert_eq!(router.select_next(None), "alpha");
}

#[test]
fn test_success_moves_affinity() {
    let router = test_router(Arc::new(ManualClock::new()));

    router.record_success("gamma");
    assert_eq!(router.sticky_model(), "gamma");
    assert_eq!(router.select_next(None), "gamma");
}

#[test]
fn test_failure_counts_report_live_counts_only() {
    let clock = Arc::new(ManualClock::new());
    let router = test_router(clock.clone());

    router.record_failure("alpha");
    router.record_failure("alpha");
    router.record_failure("beta");

    let counts = router.failure_counts();
    assert_eq!(counts.get("alpha"), Some(&2));
    assert_eq!(counts.get("beta"), Some(&1));

    clock.advance(Duration::from_secs(301));
    assert!(router.failure_counts().is_empty());
}
