//! Wheel items and spin outcomes

use serde::{Deserialize, Serialize};

use crate::error::{SpinError, SpinResult};

/// Fallback fill for items stored without a color
pub const DEFAULT_ITEM_COLOR: &str = "#888888";

/// Starter palette, one color per default prize
pub const DEFAULT_PALETTE: [&str; 4] = ["#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4"];

fn default_color() -> String {
    DEFAULT_ITEM_COLOR.to_string()
}

/// One segment of the wheel
///
/// Weights are relative and unnormalized: `[1, 3]` and `[25, 75]` describe the
/// same wheel. Documents written with `text`/`probability` keys load as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelItem {
    /// Stable unique key
    pub id: String,
    /// Display text
    #[serde(alias = "text")]
    pub label: String,
    /// Display color (CSS notation)
    #[serde(default = "default_color")]
    pub color: String,
    /// Relative likelihood, must be >= 0
    #[serde(alias = "probability")]
    pub weight: f64,
}

impl WheelItem {
    /// Create an item
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        color: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color: color.into(),
            weight,
        }
    }

    /// Create an item with the default color
    pub fn weighted(id: impl Into<String>, label: impl Into<String>, weight: f64) -> Self {
        Self::new(id, label, DEFAULT_ITEM_COLOR, weight)
    }

    /// Weight usable in a draw (finite and non-negative)
    #[inline]
    pub fn has_valid_weight(&self) -> bool {
        self.weight.is_finite() && self.weight >= 0.0
    }
}

/// The four equally weighted prizes a fresh wheel starts with
pub fn default_prizes() -> Vec<WheelItem> {
    DEFAULT_PALETTE
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let n = i + 1;
            WheelItem::new(n.to_string(), format!("Prize {n}"), *color, 25.0)
        })
        .collect()
}

/// Check the invariants the engine consumes: non-empty, every weight >= 0
pub fn validate_items(items: &[WheelItem]) -> SpinResult<()> {
    if items.is_empty() {
        return Err(SpinError::InvalidInput("item list is empty".into()));
    }
    if let Some((index, item)) = items
        .iter()
        .enumerate()
        .find(|(_, item)| !item.has_valid_weight())
    {
        return Err(SpinError::InvalidInput(format!(
            "item {} ('{}') has invalid weight {}",
            index, item.label, item.weight
        )));
    }
    Ok(())
}

/// Result of one draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Position of the winner in the snapshot
    pub index: usize,
    /// Snapshot of the winning item
    pub item: WheelItem,
}
