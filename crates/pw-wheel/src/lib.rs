//! # pw-wheel — Spin Resolution Engine for PrizeWheel
//!
//! Turns a list of weighted wheel items into one probabilistically correct
//! winner and drives a rotation whose resting position always shows that
//! winner under the pointer.
//!
//! ## Features
//!
//! - **Selector**: cumulative-distribution draw over unnormalized weights
//! - **SpinController**: re-entrancy guarded `Idle`/`Spinning` state machine
//! - **Angle Math**: normalized landing computation, safe for any accumulated angle
//! - **Timing Profiles**: Normal, Turbo, Instant and custom spin timing
//! - **Injected Randomness**: seeded sources for reproducible results
//!
//! ## Architecture
//!
//! ```text
//! WheelItem snapshot
//!     │
//!     v
//! SpinController ── select() ──> SpinOutcome
//!     │
//!     ├── compute_target_angle()
//!     v
//! Animator (rendering layer) ── animation_complete(spin_id) ──> listener(SpinOutcome)
//! ```

pub mod angle;
pub mod config;
pub mod controller;
pub mod easing;
pub mod error;
pub mod item;
pub mod random;
pub mod selector;
pub mod shared;
pub mod stats;
pub mod timing;

pub use angle::*;
pub use config::*;
pub use controller::*;
pub use easing::*;
pub use error::*;
pub use item::*;
pub use random::*;
pub use selector::*;
pub use shared::*;
pub use stats::*;
pub use timing::*;
