//! Weighted outcome selection
//!
//! Cumulative-distribution draw over unnormalized weights. Items are walked in
//! list order; the first item whose running total reaches the scaled draw
//! wins. A draw landing exactly on a boundary therefore resolves to the
//! earlier item. Zero-weight items are never chosen unless every weight is
//! zero, in which case the wheel is treated as uniformly weighted.

use crate::error::SpinResult;
use crate::item::{SpinOutcome, WheelItem, validate_items};
use crate::random::{RandomUnit, UnitFn, sanitize_unit};

/// Weights actually used for a draw, applying the all-zero uniform fallback
///
/// Finite weights whose sum overflows are rescaled by the largest weight,
/// which keeps their ratios.
pub fn effective_weights(items: &[WheelItem]) -> Vec<f64> {
    let weights: Vec<f64> = items.iter().map(|item| item.weight).collect();
    let total: f64 = weights.iter().sum();
    if total.is_infinite() {
        let largest = weights.iter().copied().fold(0.0, f64::max);
        if largest.is_finite() && largest > 0.0 {
            return weights.into_iter().map(|w| w / largest).collect();
        }
    }
    if total > 0.0 {
        weights
    } else {
        vec![1.0; items.len()]
    }
}

/// Normalized selection probability of every item
pub fn probabilities(items: &[WheelItem]) -> Vec<f64> {
    let weights = effective_weights(items);
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return weights;
    }
    weights.into_iter().map(|w| w / total).collect()
}

/// Draw one outcome according to relative weight
///
/// Fails with `InvalidInput` on an empty list or a negative/non-finite weight.
/// Consumes exactly one value from `random`.
pub fn select<R>(items: &[WheelItem], random: &mut R) -> SpinResult<SpinOutcome>
where
    R: RandomUnit + ?Sized,
{
    validate_items(items)?;

    let weights = effective_weights(items);
    let total: f64 = weights.iter().sum();
    let r = sanitize_unit(random.next_unit()) * total;

    let index = pick_index(&weights, r);
    Ok(SpinOutcome {
        index,
        item: items[index].clone(),
    })
}

/// [`select`] driven by a plain closure
pub fn select_with<F>(items: &[WheelItem], random_unit: F) -> SpinResult<SpinOutcome>
where
    F: FnMut() -> f64,
{
    select(items, &mut UnitFn(random_unit))
}

fn pick_index(weights: &[f64], r: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;

    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        last_positive = i;
        cumulative += w;
        if cumulative >= r {
            return i;
        }
    }

    // Rounding left the running sum a hair below r
    last_positive
}
