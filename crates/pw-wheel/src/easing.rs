//! Easing curves for the spin animation

use serde::{Deserialize, Serialize};

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 40;
const SOLVE_EPSILON: f64 = 1e-7;

/// Progress-to-position curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    /// Constant angular speed
    Linear,
    /// CSS-style cubic Bézier through (0,0), (x1,y1), (x2,y2), (1,1)
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for Easing {
    fn default() -> Self {
        Self::wheel()
    }
}

impl Easing {
    /// Long deceleration used for the prize wheel
    pub fn wheel() -> Self {
        Self::CubicBezier {
            x1: 0.22,
            y1: 0.98,
            x2: 0.2,
            y2: 0.99,
        }
    }

    /// CSS `ease-out`
    pub fn ease_out() -> Self {
        Self::CubicBezier {
            x1: 0.0,
            y1: 0.0,
            x2: 0.58,
            y2: 1.0,
        }
    }

    /// Map linear progress in `[0, 1]` to eased progress
    ///
    /// Input is clamped; the endpoints map exactly to 0 and 1.
    pub fn apply(&self, progress: f64) -> f64 {
        let t = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => t,
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                let s = solve_curve_x(t, x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
                bezier(s, y1, y2)
            }
        }
    }
}

/// One axis of the Bézier with fixed endpoints 0 and 1
#[inline]
fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

#[inline]
fn bezier_derivative(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Curve parameter whose x equals `x`
fn solve_curve_x(x: f64, x1: f64, x2: f64) -> f64 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier(s, x1, x2) - x;
        if err.abs() < SOLVE_EPSILON {
            return s;
        }
        let slope = bezier_derivative(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    // x(s) is monotonic for x1, x2 in [0, 1]
    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let current = bezier(s, x1, x2);
        if (current - x).abs() < SOLVE_EPSILON {
            break;
        }
        if current < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}
