//! Session statistics

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::SpinOutcome;

/// Counters kept by a controller across spins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Completed spins (including force-completed ones)
    pub total_spins: u64,
    /// Requests refused (empty list, bad weights, already spinning)
    pub rejected_spins: u64,
    /// Spins force-completed by the stall timeout
    pub stalled_spins: u64,
    /// Completed spins per winning item id
    pub wins_by_id: HashMap<String, u64>,
}

impl SessionStats {
    /// Record a completed spin
    pub fn record_win(&mut self, outcome: &SpinOutcome) {
        self.total_spins += 1;
        *self.wins_by_id.entry(outcome.item.id.clone()).or_insert(0) += 1;
    }

    /// Record a refused request
    pub fn record_rejection(&mut self) {
        self.rejected_spins += 1;
    }

    /// Record a forced completion
    pub fn record_stall(&mut self) {
        self.stalled_spins += 1;
    }

    /// Wins for one item id
    pub fn wins(&self, id: &str) -> u64 {
        self.wins_by_id.get(id).copied().unwrap_or(0)
    }

    /// Share of completed spins won by an item id
    pub fn win_rate(&self, id: &str) -> f64 {
        if self.total_spins > 0 {
            self.wins(id) as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }
}
