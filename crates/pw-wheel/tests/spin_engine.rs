//! Spin Engine Test Suite
//!
//! End-to-end checks of selection and the spin state machine:
//! - Weighted frequency convergence (χ² goodness of fit)
//! - Visual landing agrees with the notified winner
//! - Exactly-once completion under randomized host timing
//! - Re-entrancy and stall handling

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pw_wheel::{
    RandomUnit, RecordingAnimator, ScriptedUnits, SpinController, SpinError, SpinOutcome,
    SpinPhase, SpinSettings, WheelConfig, WheelItem, angular_distance, index_at_pointer,
    normalize_degrees, probabilities, seeded, segment_center, select,
};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn weighted(weights: &[f64]) -> Vec<WheelItem> {
    weights
        .iter()
        .enumerate()
        .map(|(i, w)| WheelItem::weighted(format!("item-{i}"), format!("Item {i}"), *w))
        .collect()
}

fn letters() -> Vec<WheelItem> {
    ["A", "B", "C", "D"]
        .iter()
        .map(|l| WheelItem::weighted(*l, *l, 1.0))
        .collect()
}

fn chi_square(counts: &[u64], expected_probabilities: &[f64]) -> f64 {
    let n: u64 = counts.iter().sum();
    counts
        .iter()
        .zip(expected_probabilities)
        .filter(|(_, p)| **p > 0.0)
        .map(|(observed, p)| {
            let expected = p * n as f64;
            let diff = *observed as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_frequencies_converge_to_weights() {
    let items = weighted(&[1.0, 2.0, 3.0, 4.0]);
    let mut rng = seeded(20_240_601);
    let mut counts = vec![0u64; items.len()];
    for _ in 0..40_000 {
        counts[select(&items, &mut rng).unwrap().index] += 1;
    }

    // df = 3, p = 0.9999
    let statistic = chi_square(&counts, &probabilities(&items));
    assert!(statistic < 21.11, "χ² = {statistic}, counts = {counts:?}");
}

#[test]
fn test_uniform_fallback_frequencies() {
    let items = weighted(&[0.0, 0.0]);
    let mut rng = seeded(5);
    let mut counts = vec![0u64; 2];
    for _ in 0..20_000 {
        counts[select(&items, &mut rng).unwrap().index] += 1;
    }
    // df = 1, p = 0.9999
    let statistic = chi_square(&counts, &[0.5, 0.5]);
    assert!(statistic < 15.14, "χ² = {statistic}, counts = {counts:?}");
}

#[test]
fn test_same_seed_same_sequence() {
    let items = weighted(&[0.5, 7.0, 1.25, 3.0, 0.0, 2.0]);
    let run = |seed: u64| -> Vec<usize> {
        let mut rng = seeded(seed);
        (0..200)
            .map(|_| select(&items, &mut rng).unwrap().index)
            .collect()
    };
    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}

// ═══════════════════════════════════════════════════════════════════════════════
// LANDING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_scenario_equal_quarters() {
    let animator = RecordingAnimator::new();
    let mut controller = SpinController::new(ScriptedUnits::new(vec![0.9]), animator.clone())
        .with_jitter_fraction(0.0);

    let request = controller.request_spin(&letters()).unwrap();
    let outcome = controller.animation_complete(request.spin_id).unwrap();

    assert_eq!(outcome.index, 3);
    assert_eq!(outcome.item.label, "D");
    let shown = normalize_degrees(-request.target_angle);
    assert!(angular_distance(shown, 315.0) < 1e-9);
    assert_eq!(animator.requests().len(), 1);
}

#[test]
fn test_landing_survives_huge_accumulated_angles() {
    let items = weighted(&[1.0, 1.0, 2.0, 5.0, 0.5]);
    let mut controller = SpinController::new(seeded(8), RecordingAnimator::new())
        .with_timing(pw_wheel::TimingConfig::normal().with_extra_rotations(250_000))
        .with_jitter_fraction(0.9);

    // Each spin adds ~9e7 degrees; renormalization keeps the value bounded
    for _ in 0..50 {
        let outcome = controller.resolve_immediately(&items).unwrap();
        assert_eq!(index_at_pointer(controller.accumulated_angle(), items.len()), outcome.index);
        assert!(controller.accumulated_angle().abs() < 1e9);
    }
}

#[test]
fn test_rest_position_is_inside_winning_arc() {
    let items = weighted(&[3.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    let span = 360.0 / items.len() as f64;
    let mut controller = SpinController::new(seeded(31), RecordingAnimator::new())
        .with_jitter_fraction(0.99);

    for _ in 0..1_000 {
        let outcome = controller.resolve_immediately(&items).unwrap();
        let shown = normalize_degrees(-controller.accumulated_angle());
        let offset = angular_distance(shown, segment_center(outcome.index, items.len()));
        assert!(offset < span / 2.0, "offset {offset} escapes arc of {span}");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE MACHINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Drives a controller like a host event loop with irregular frame timing
#[test]
fn test_exactly_once_under_randomized_completion_timing() {
    let items = weighted(&[2.0, 1.0, 4.0, 1.0, 3.0]);
    let animator = RecordingAnimator::new();
    let mut controller = SpinController::new(seeded(4242), animator.clone());

    let notified: Arc<Mutex<Vec<SpinOutcome>>> = Arc::new(Mutex::new(Vec::new()));
    {
        let notified = Arc::clone(&notified);
        controller.on_spin_complete(move |outcome| notified.lock().push(outcome.clone()));
    }

    let mut host = seeded(777);
    // (frames left, spin id) for completions the renderer will deliver
    let mut scheduled: VecDeque<(u32, u64)> = VecDeque::new();
    let mut accepted: Vec<(u64, usize, f64)> = Vec::new();
    let mut rejected = 0u32;

    while accepted.len() < 1_000 {
        // Host tries to spin at random moments, often while one is running
        if host.next_unit() < 0.6 {
            let was_spinning = controller.is_spinning();
            let pending_before = controller.pending_winner_index();
            let angle_before = controller.accumulated_angle();
            match controller.request_spin(&items) {
                Ok(request) => {
                    assert!(!was_spinning);
                    let frames = (host.next_unit() * 6.0) as u32;
                    scheduled.push_back((frames, request.spin_id));
                    accepted.push((
                        request.spin_id,
                        controller.pending_winner_index().unwrap(),
                        request.target_angle,
                    ));
                }
                Err(SpinError::AlreadySpinning { .. }) => {
                    assert!(was_spinning);
                    assert_eq!(controller.pending_winner_index(), pending_before);
                    assert_eq!(controller.accumulated_angle(), angle_before);
                    rejected += 1;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // Renderer advances one frame
        for entry in scheduled.iter_mut() {
            entry.0 = entry.0.saturating_sub(1);
        }
        while let Some(&(0, spin_id)) = scheduled.front() {
            scheduled.pop_front();
            let before = notified.lock().len();
            let outcome = controller.animation_complete(spin_id);
            assert!(outcome.is_some());
            assert_eq!(controller.phase(), SpinPhase::Idle);
            assert_eq!(notified.lock().len(), before + 1);

            // Unrelated duplicate signal from the renderer
            if host.next_unit() < 0.3 {
                assert!(controller.animation_complete(spin_id).is_none());
                assert_eq!(notified.lock().len(), before + 1);
            }
        }
    }

    // Drain the last in-flight spin
    while let Some((_, spin_id)) = scheduled.pop_front() {
        controller.animation_complete(spin_id);
    }

    let notified = notified.lock();
    assert_eq!(notified.len(), accepted.len());
    for (outcome, (_, index, _)) in notified.iter().zip(&accepted) {
        assert_eq!(outcome.index, *index);
    }
    assert_eq!(animator.len(), accepted.len());
    assert!(rejected > 0);
    assert_eq!(controller.stats().total_spins, 1_000);
    assert_eq!(controller.stats().rejected_spins, u64::from(rejected));

    let (_, last_index, last_target) = accepted[accepted.len() - 1];
    assert_eq!(controller.accumulated_angle(), last_target);
    assert_eq!(controller.index_under_pointer(items.len()), last_index);
}

#[test]
fn test_stall_then_recover() {
    let settings = SpinSettings::default().with_stall_timeout_ms(250.0);
    let mut controller =
        SpinController::from_settings(&settings, seeded(12), RecordingAnimator::new()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = Arc::clone(&calls);
        controller.on_spin_complete(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    let t0 = Instant::now();
    let request = controller.request_spin_at(&letters(), t0).unwrap();
    assert!(matches!(
        controller.request_spin_at(&letters(), t0 + Duration::from_millis(10)),
        Err(SpinError::AlreadySpinning { .. })
    ));

    let stalled = controller.check_stall(t0 + Duration::from_millis(300));
    assert!(matches!(stalled, Err(SpinError::AnimationStalled { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.accumulated_angle(), request.target_angle);

    let next = controller.request_spin(&letters()).unwrap();
    assert!(controller.animation_complete(next.spin_id).is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_default_wheel_from_config() {
    let config = WheelConfig::default();
    let mut controller =
        SpinController::from_settings(&config.spin, seeded(1), RecordingAnimator::new()).unwrap();
    let outcome = controller.resolve_immediately(&config.items).unwrap();
    assert!(outcome.item.label.starts_with("Prize "));
    assert_eq!(controller.timing().duration_ms, 4000.0);
}

#[test]
fn test_demo_wheel_document() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/office-lunch.yaml");
    let config = WheelConfig::load(path).unwrap();
    assert_eq!(config.items.len(), 5);
    assert_eq!(config.spin.stall_timeout_ms, Some(8000.0));

    let mut controller =
        SpinController::from_settings(&config.spin, seeded(21), RecordingAnimator::new()).unwrap();
    for _ in 0..500 {
        let outcome = controller.resolve_immediately(&config.items).unwrap();
        assert_ne!(outcome.item.id, "surprise");
    }
}
