//! Thread-safe controller handle
//!
//! Hosts with real threads share one [`SpinController`] behind a mutex. The
//! `Idle`/`Spinning` check and the transition happen under the same lock, so
//! two threads can never both get a spin accepted.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::controller::{AnimationRequest, SpinController, SpinId, SpinListener, SpinPhase};
use crate::error::SpinResult;
use crate::item::{SpinOutcome, WheelItem};
use crate::stats::SessionStats;
use crate::timing::duration_from_ms;

/// Spin accepted by [`SharedSpinController::spin_with_timer`]
#[derive(Debug)]
pub struct TimedSpin {
    /// What was handed to the animator
    pub request: AnimationRequest,
    /// Timer thread; yields the outcome it completed, if it was still pending
    pub handle: JoinHandle<Option<SpinOutcome>>,
}

/// Cloneable, `Send + Sync` handle to a controller
#[derive(Clone)]
pub struct SharedSpinController {
    inner: Arc<Mutex<SpinController>>,
    subscribers: Arc<Mutex<Vec<Sender<SpinOutcome>>>>,
    listeners: Arc<Mutex<Vec<SpinListener>>>,
}

impl std::fmt::Debug for SharedSpinController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSpinController")
            .field("phase", &self.phase())
            .field("subscribers", &self.subscribers.lock().len())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl SharedSpinController {
    /// Wrap a controller
    ///
    /// Installs a completion listener that broadcasts to [`subscribe`](Self::subscribe)
    /// receivers and [`on_spin_complete`](Self::on_spin_complete) callbacks,
    /// replacing any listener registered on `controller`.
    pub fn new(mut controller: SpinController) -> Self {
        let subscribers: Arc<Mutex<Vec<Sender<SpinOutcome>>>> = Arc::new(Mutex::new(Vec::new()));
        let listeners: Arc<Mutex<Vec<SpinListener>>> = Arc::new(Mutex::new(Vec::new()));
        let fan_out = Arc::clone(&subscribers);
        let callbacks = Arc::clone(&listeners);
        controller.on_spin_complete(move |outcome| {
            fan_out
                .lock()
                .retain(|tx| tx.send(outcome.clone()).is_ok());
            for listener in callbacks.lock().iter_mut() {
                listener(outcome);
            }
        });

        Self {
            inner: Arc::new(Mutex::new(controller)),
            subscribers,
            listeners,
        }
    }

    /// Receive every completed outcome from now on
    pub fn subscribe(&self) -> Receiver<SpinOutcome> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Add a completion callback alongside the subscribers
    ///
    /// Callbacks run while the controller is locked and must not call back
    /// into this handle.
    pub fn on_spin_complete(&self, listener: impl FnMut(&SpinOutcome) + Send + 'static) {
        self.listeners.lock().push(Box::new(listener));
    }

    /// See [`SpinController::request_spin`]
    pub fn request_spin(&self, items: &[WheelItem]) -> SpinResult<AnimationRequest> {
        self.inner.lock().request_spin(items)
    }

    /// See [`SpinController::animation_complete`]
    pub fn animation_complete(&self, spin_id: SpinId) -> Option<SpinOutcome> {
        self.inner.lock().animation_complete(spin_id)
    }

    /// See [`SpinController::check_stall`]
    pub fn check_stall(&self, now: Instant) -> SpinResult<()> {
        self.inner.lock().check_stall(now)
    }

    /// Accept a spin and complete it from a timer thread after its duration
    ///
    /// A duration that cannot be slept is refused before the spin is accepted.
    /// If the timer thread cannot be started the spin is completed on the
    /// spot with its recorded outcome and the spawn error is returned.
    pub fn spin_with_timer(&self, items: &[WheelItem]) -> SpinResult<TimedSpin> {
        let (request, delay) = {
            let mut controller = self.inner.lock();
            let delay = duration_from_ms(controller.timing().duration_ms)?;
            (controller.request_spin(items)?, delay)
        };
        self.start_timer(request, delay, thread::Builder::new())
    }

    fn start_timer(
        &self,
        request: AnimationRequest,
        delay: Duration,
        builder: thread::Builder,
    ) -> SpinResult<TimedSpin> {
        let spin_id = request.spin_id;
        let inner = Arc::clone(&self.inner);

        let spawned = builder
            .name(format!("wheel-spin-{spin_id}"))
            .spawn(move || {
                thread::sleep(delay);
                inner.lock().animation_complete(spin_id)
            });

        match spawned {
            Ok(handle) => Ok(TimedSpin { request, handle }),
            Err(e) => {
                log::error!("Timer for spin {} failed to start: {}", spin_id, e);
                self.animation_complete(spin_id);
                Err(e.into())
            }
        }
    }

    pub fn phase(&self) -> SpinPhase {
        self.inner.lock().phase()
    }

    pub fn accumulated_angle(&self) -> f64 {
        self.inner.lock().accumulated_angle()
    }

    /// Snapshot of the session counters
    pub fn stats(&self) -> SessionStats {
        self.inner.lock().stats().clone()
    }

    /// Run a closure with exclusive access to the controller
    ///
    /// Registering a listener on the controller here detaches every
    /// subscriber; use [`on_spin_complete`](Self::on_spin_complete) instead.
    pub fn with_controller<T>(&self, f: impl FnOnce(&mut SpinController) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
