//! Spin Controller — `Idle`/`Spinning` state machine
//!
//! Owns the accumulated wheel angle and the single in-flight spin. A request
//! draws the winner, computes a landing angle for it and hands the rendering
//! layer an [`AnimationRequest`]. When the renderer reports back with the
//! matching spin id the controller commits the angle, returns to `Idle` and
//! only then notifies the listener with the outcome drawn at request time.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::angle::{compute_target_angle, index_at_pointer, max_jitter, renormalize};
use crate::config::{DEFAULT_JITTER_FRACTION, SpinSettings};
use crate::easing::Easing;
use crate::error::{SpinError, SpinResult};
use crate::item::{SpinOutcome, WheelItem};
use crate::random::{RandomUnit, sanitize_unit};
use crate::selector::select;
use crate::stats::SessionStats;
use crate::timing::{TimingConfig, duration_from_ms};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifier of one accepted spin
pub type SpinId = u64;

/// Completion listener
pub type SpinListener = Box<dyn FnMut(&SpinOutcome) + Send>;

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpinPhase {
    /// Ready to accept a spin
    #[default]
    Idle,
    /// A spin is animating; further requests are refused
    Spinning,
}

/// What the rendering layer is asked to animate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationRequest {
    /// Token to pass back to [`SpinController::animation_complete`]
    pub spin_id: SpinId,
    /// Wheel angle at the start of the spin (degrees)
    pub start_angle: f64,
    /// Wheel angle at rest (degrees)
    pub target_angle: f64,
    /// Animation length (ms)
    pub duration_ms: f64,
    /// Progress curve
    pub easing: Easing,
}

impl AnimationRequest {
    /// Total rotation covered by the spin
    #[inline]
    pub fn travel(&self) -> f64 {
        self.target_angle - self.start_angle
    }

    /// Linear progress after `elapsed_ms`, clamped to `[0, 1]`
    pub fn progress_at(&self, elapsed_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Eased wheel angle after `elapsed_ms`
    pub fn angle_at(&self, elapsed_ms: f64) -> f64 {
        let progress = self.progress_at(elapsed_ms);
        if progress >= 1.0 {
            return self.target_angle;
        }
        self.start_angle + self.travel() * self.easing.apply(progress)
    }
}

/// Rendering-side capability: animate a rotation, then report back once
pub trait Animator {
    /// Start animating. Completion is reported through
    /// [`SpinController::animation_complete`] with `request.spin_id`.
    fn animate(&mut self, request: &AnimationRequest);
}

impl<F: FnMut(&AnimationRequest)> Animator for F {
    fn animate(&mut self, request: &AnimationRequest) {
        self(request)
    }
}

/// Animator that only records requests; completion is driven by the caller
#[derive(Debug, Clone, Default)]
pub struct RecordingAnimator {
    requests: Arc<Mutex<Vec<AnimationRequest>>>,
}

impl RecordingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<AnimationRequest> {
        self.requests.lock().clone()
    }

    /// Most recent request
    pub fn last(&self) -> Option<AnimationRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests seen
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

impl Animator for RecordingAnimator {
    fn animate(&mut self, request: &AnimationRequest) {
        self.requests.lock().push(request.clone());
    }
}

/// Spin accepted but not yet completed
#[derive(Debug, Clone)]
struct PendingSpin {
    spin_id: SpinId,
    outcome: SpinOutcome,
    target_angle: f64,
    started_at: Instant,
}

/// State owned exclusively by the controller
#[derive(Debug, Clone, Default)]
struct SpinState {
    phase: SpinPhase,
    accumulated_angle: f64,
    pending: Option<PendingSpin>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Spin state machine
///
/// Reusable indefinitely: every accepted spin ends back in `Idle`.
pub struct SpinController {
    state: SpinState,
    timing: TimingConfig,
    jitter_fraction: f64,
    stall_timeout: Option<Duration>,
    random: Box<dyn RandomUnit + Send>,
    animator: Box<dyn Animator + Send>,
    listener: Option<SpinListener>,
    next_spin_id: SpinId,
    stats: SessionStats,
}

impl std::fmt::Debug for SpinController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinController")
            .field("state", &self.state)
            .field("timing", &self.timing)
            .field("jitter_fraction", &self.jitter_fraction)
            .field("stall_timeout", &self.stall_timeout)
            .field("next_spin_id", &self.next_spin_id)
            .finish_non_exhaustive()
    }
}

impl SpinController {
    /// Create with normal timing, default jitter and no stall timeout
    pub fn new(
        random: impl RandomUnit + Send + 'static,
        animator: impl Animator + Send + 'static,
    ) -> Self {
        Self {
            state: SpinState::default(),
            timing: TimingConfig::normal(),
            jitter_fraction: DEFAULT_JITTER_FRACTION,
            stall_timeout: None,
            random: Box::new(random),
            animator: Box::new(animator),
            listener: None,
            next_spin_id: 1,
            stats: SessionStats::default(),
        }
    }

    /// Create from validated settings
    pub fn from_settings(
        settings: &SpinSettings,
        random: impl RandomUnit + Send + 'static,
        animator: impl Animator + Send + 'static,
    ) -> SpinResult<Self> {
        settings.validate()?;
        let mut controller = Self::new(random, animator)
            .with_timing(settings.timing_config())
            .with_jitter_fraction(settings.jitter_fraction);
        if let Some(ms) = settings.stall_timeout_ms {
            controller = controller.with_stall_timeout(duration_from_ms(ms)?);
        }
        Ok(controller)
    }

    /// Builder: set timing
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set jitter fraction (clamped below one half segment when applied)
    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    /// Builder: force-complete spins whose animation never reports back
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = Some(timeout);
        self
    }

    /// Register the completion listener, replacing any previous one
    pub fn on_spin_complete(&mut self, listener: impl FnMut(&SpinOutcome) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn phase(&self) -> SpinPhase {
        self.state.phase
    }

    pub fn is_spinning(&self) -> bool {
        self.state.phase == SpinPhase::Spinning
    }

    /// Wheel angle at rest after the last completed spin
    pub fn accumulated_angle(&self) -> f64 {
        self.state.accumulated_angle
    }

    /// Winner index of the in-flight spin
    pub fn pending_winner_index(&self) -> Option<usize> {
        self.state.pending.as_ref().map(|p| p.outcome.index)
    }

    /// Id of the in-flight spin
    pub fn pending_spin_id(&self) -> Option<SpinId> {
        self.state.pending.as_ref().map(|p| p.spin_id)
    }

    /// Segment under the pointer at the current resting angle
    pub fn index_under_pointer(&self, item_count: usize) -> usize {
        index_at_pointer(self.state.accumulated_angle, item_count)
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSITIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// `Idle -> Spinning`
    ///
    /// Refused with `AlreadySpinning` while a spin is in flight and with
    /// `InvalidInput` for an empty list; neither changes any state.
    pub fn request_spin(&mut self, items: &[WheelItem]) -> SpinResult<AnimationRequest> {
        self.request_spin_at(items, Instant::now())
    }

    /// [`request_spin`](Self::request_spin) with an explicit start time
    pub fn request_spin_at(
        &mut self,
        items: &[WheelItem],
        now: Instant,
    ) -> SpinResult<AnimationRequest> {
        if let Some(pending) = &self.state.pending {
            let spin_id = pending.spin_id;
            self.stats.record_rejection();
            log::warn!("Spin refused: spin {} still in progress", spin_id);
            return Err(SpinError::AlreadySpinning { spin_id });
        }

        let outcome = match select(items, self.random.as_mut()) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.record_rejection();
                return Err(e);
            }
        };

        let item_count = items.len();
        let jitter_limit = max_jitter(item_count, self.jitter_fraction);
        let jitter = if jitter_limit > 0.0 {
            (sanitize_unit(self.random.next_unit()) * 2.0 - 1.0) * jitter_limit
        } else {
            0.0
        };

        let start_angle = self.state.accumulated_angle;
        let target_angle = compute_target_angle(
            start_angle,
            outcome.index,
            item_count,
            self.timing.extra_rotations.max(1),
            jitter,
        );

        let spin_id = self.next_spin_id;
        self.next_spin_id += 1;

        let request = AnimationRequest {
            spin_id,
            start_angle,
            target_angle,
            duration_ms: self.timing.duration_ms,
            easing: self.timing.easing,
        };

        log::debug!(
            "Spin {} accepted: winner #{} '{}', {:.2}° -> {:.2}°",
            spin_id,
            outcome.index,
            outcome.item.label,
            start_angle,
            target_angle
        );

        self.state.pending = Some(PendingSpin {
            spin_id,
            outcome,
            target_angle,
            started_at: now,
        });
        self.state.phase = SpinPhase::Spinning;

        self.animator.animate(&request);
        Ok(request)
    }

    /// `Spinning -> Idle`
    ///
    /// Only the id of the in-flight spin completes it; stale or unknown ids
    /// are ignored and return `None`.
    pub fn animation_complete(&mut self, spin_id: SpinId) -> Option<SpinOutcome> {
        match self.state.pending.take() {
            Some(pending) if pending.spin_id == spin_id => Some(self.finish(pending)),
            other => {
                self.state.pending = other;
                log::warn!("Ignoring completion signal for spin {}", spin_id);
                None
            }
        }
    }

    /// Force-complete a spin whose animation has not reported back in time
    ///
    /// Returns `AnimationStalled` after completing with the recorded outcome.
    /// Without a configured timeout this never fires.
    pub fn check_stall(&mut self, now: Instant) -> SpinResult<()> {
        let Some(timeout) = self.stall_timeout else {
            return Ok(());
        };
        let elapsed = match &self.state.pending {
            Some(pending) => now.saturating_duration_since(pending.started_at),
            None => return Ok(()),
        };
        if elapsed < timeout {
            return Ok(());
        }

        let Some(pending) = self.state.pending.take() else {
            return Ok(());
        };
        let spin_id = pending.spin_id;
        log::warn!(
            "Spin {} animation stalled after {} ms, completing with recorded outcome",
            spin_id,
            elapsed.as_millis()
        );
        self.stats.record_stall();
        self.finish(pending);

        Err(SpinError::AnimationStalled {
            spin_id,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        })
    }

    /// Request a spin and complete it immediately (headless hosts, simulations)
    pub fn resolve_immediately(&mut self, items: &[WheelItem]) -> SpinResult<SpinOutcome> {
        let request = self.request_spin(items)?;
        self.animation_complete(request.spin_id).ok_or_else(|| {
            SpinError::InvalidInput(format!("spin {} was not pending", request.spin_id))
        })
    }

    fn finish(&mut self, pending: PendingSpin) -> SpinOutcome {
        // State is committed before anyone hears about the winner
        self.state.accumulated_angle = renormalize(pending.target_angle);
        self.state.phase = SpinPhase::Idle;
        self.stats.record_win(&pending.outcome);

        let outcome = pending.outcome;
        if let Some(listener) = self.listener.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| listener(&outcome))).is_err() {
                log::error!("Spin {} completion listener panicked", pending.spin_id);
            }
        }
        outcome
    }
}
