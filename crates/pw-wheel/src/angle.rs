//! Angle utilities
//!
//! Segments are laid out clockwise in list order starting at 0°. The pointer
//! is fixed at 0° and the wheel rotates beneath it, so bringing a wheel-local
//! angle `θ` under the pointer needs a rotation of `(360 - θ) mod 360`.
//! All landing math works on the accumulated angle modulo 360, which keeps it
//! correct however large the accumulated rotation has grown.

/// Degrees in a full turn
pub const FULL_TURN_DEG: f64 = 360.0;

/// Fixed pointer position
pub const POINTER_ANGLE_DEG: f64 = 0.0;

/// Accumulated angles beyond this magnitude are folded back into `[0, 360)`
pub const RENORMALIZE_THRESHOLD_DEG: f64 = FULL_TURN_DEG * 100_000.0;

/// Fold any angle into `[0, 360)`
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let folded = angle.rem_euclid(FULL_TURN_DEG);
    // rem_euclid can round tiny negatives up to exactly 360
    if folded >= FULL_TURN_DEG { 0.0 } else { folded }
}

/// Smallest absolute difference between two angles, in `[0, 180]`
#[inline]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    diff.min(FULL_TURN_DEG - diff)
}

/// Degrees per item
#[inline]
pub fn segment_span(item_count: usize) -> f64 {
    FULL_TURN_DEG / item_count.max(1) as f64
}

/// Wheel-local angle of a segment's center
#[inline]
pub fn segment_center(index: usize, item_count: usize) -> f64 {
    let span = segment_span(item_count);
    index as f64 * span + span / 2.0
}

/// Wheel rotation (in `[0, 360)`) that puts a segment's center under the pointer
#[inline]
pub fn resting_rotation(index: usize, item_count: usize) -> f64 {
    normalize_degrees(FULL_TURN_DEG - segment_center(index, item_count) + POINTER_ANGLE_DEG)
}

/// Minimal forward rotation from the current orientation to the one showing `index`
pub fn forward_delta(accumulated: f64, index: usize, item_count: usize) -> f64 {
    let current = normalize_degrees(accumulated);
    normalize_degrees(resting_rotation(index, item_count) - current + FULL_TURN_DEG)
}

/// Largest jitter magnitude allowed for a wheel of `item_count` items
///
/// `fraction` is clamped into `[0, 1)`, so the result always stays strictly
/// below half a segment and the resting point never leaves the winning arc.
pub fn max_jitter(item_count: usize, fraction: f64) -> f64 {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0 - f64::EPSILON)
    } else {
        0.0
    };
    fraction * segment_span(item_count) / 2.0
}

/// Final wheel angle for a spin landing on `index`
///
/// `accumulated + extra_rotations * 360 + forward_delta + jitter`
pub fn compute_target_angle(
    accumulated: f64,
    index: usize,
    item_count: usize,
    extra_rotations: u32,
    jitter: f64,
) -> f64 {
    accumulated
        + f64::from(extra_rotations) * FULL_TURN_DEG
        + forward_delta(accumulated, index, item_count)
        + jitter
}

/// Index of the segment currently under the pointer
pub fn index_at_pointer(rotation: f64, item_count: usize) -> usize {
    if item_count == 0 {
        return 0;
    }
    let local = normalize_degrees(POINTER_ANGLE_DEG - rotation);
    let index = (local / segment_span(item_count)).floor() as usize;
    index.min(item_count - 1)
}

/// Bound an accumulated angle without changing the orientation it shows
#[inline]
pub fn renormalize(accumulated: f64) -> f64 {
    if accumulated.abs() > RENORMALIZE_THRESHOLD_DEG {
        normalize_degrees(accumulated)
    } else {
        accumulated
    }
}
