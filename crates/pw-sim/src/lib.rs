//! # pw-sim — Batch spin simulator
//!
//! Runs large numbers of seeded spins through real [`SpinController`]s and
//! compares observed winner frequencies with the configured weights.
//!
//! Work is split into a fixed number of chunks, each with its own ChaCha
//! stream, so a report depends only on `(seed, chunks, spins)` and not on how
//! rayon schedules the chunks.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pw_wheel::{AnimationRequest, SpinController, SpinError, WheelConfig, probabilities};

/// z-score for a 99.9% one-sided confidence level
pub const Z_999: f64 = 3.090_232;

/// Simulator errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Spin(#[from] SpinError),
}

/// Result type for simulations
pub type SimResult<T> = Result<T, SimError>;

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Total spins across all chunks
    pub spins: u64,
    /// Base seed
    pub seed: u64,
    /// Independent streams processed in parallel
    pub chunks: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            spins: 100_000,
            seed: 0,
            chunks: 8,
        }
    }
}

impl SimConfig {
    /// Builder: set spins
    pub fn with_spins(mut self, spins: u64) -> Self {
        self.spins = spins;
        self
    }

    /// Builder: set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set chunk count
    pub fn with_chunks(mut self, chunks: usize) -> Self {
        self.chunks = chunks;
        self
    }

    fn validate(&self) -> SimResult<()> {
        if self.spins == 0 {
            return Err(SimError::InvalidConfig("spins must be at least 1".into()));
        }
        if self.chunks == 0 {
            return Err(SimError::InvalidConfig("chunks must be at least 1".into()));
        }
        Ok(())
    }

    /// Spins assigned to one chunk; the remainder goes to the first chunks
    fn chunk_spins(&self, chunk: usize) -> u64 {
        let chunks = self.chunks as u64;
        let base = self.spins / chunks;
        let extra = u64::from((chunk as u64) < self.spins % chunks);
        base + extra
    }
}

/// Per-item result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTally {
    pub id: String,
    pub label: String,
    pub weight: f64,
    /// Probability implied by the weights
    pub expected_share: f64,
    /// Wins observed
    pub observed: u64,
    /// Observed wins / total spins
    pub observed_share: f64,
}

/// Simulation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub wheel: String,
    pub spins: u64,
    pub seed: u64,
    pub tallies: Vec<ItemTally>,
    /// Pearson χ² over items with non-zero expected share
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    /// Spins whose resting angle showed a different item than the winner
    pub landing_mismatches: u64,
}

impl SimReport {
    /// χ² stays under the 99.9% critical value and every landing matched
    pub fn fits_weights(&self) -> bool {
        self.landing_mismatches == 0
            && self.chi_square <= chi_square_critical(self.degrees_of_freedom, Z_999)
    }
}

/// Wilson–Hilferty approximation of the χ² critical value
pub fn chi_square_critical(degrees_of_freedom: usize, z: f64) -> f64 {
    if degrees_of_freedom == 0 {
        return 0.0;
    }
    let k = degrees_of_freedom as f64;
    let a = 2.0 / (9.0 * k);
    k * (1.0 - a + z * a.sqrt()).powi(3)
}

/// Pearson χ² statistic; items with zero expected share are skipped
pub fn chi_square(observed: &[u64], expected_shares: &[f64]) -> (f64, usize) {
    let total: u64 = observed.iter().sum();
    let mut statistic = 0.0;
    let mut categories = 0usize;
    for (&count, &share) in observed.iter().zip(expected_shares) {
        if share <= 0.0 {
            continue;
        }
        categories += 1;
        let expected = share * total as f64;
        let diff = count as f64 - expected;
        statistic += diff * diff / expected;
    }
    (statistic, categories.saturating_sub(1))
}

struct ChunkTally {
    counts: Vec<u64>,
    mismatches: u64,
}

fn run_chunk(wheel: &WheelConfig, sim: &SimConfig, chunk: usize) -> SimResult<ChunkTally> {
    let mut rng = ChaCha8Rng::seed_from_u64(sim.seed);
    rng.set_stream(chunk as u64);

    let mut controller =
        SpinController::from_settings(&wheel.spin, rng, |_: &AnimationRequest| {})?;
    let item_count = wheel.items.len();
    let mut counts = vec![0u64; item_count];
    let mut mismatches = 0u64;

    for _ in 0..sim.chunk_spins(chunk) {
        let outcome = controller.resolve_immediately(&wheel.items)?;
        counts[outcome.index] += 1;
        if controller.index_under_pointer(item_count) != outcome.index {
            mismatches += 1;
        }
    }

    log::debug!(
        "Chunk {} finished: {} spins, {} landing mismatches",
        chunk,
        controller.stats().total_spins,
        mismatches
    );
    Ok(ChunkTally { counts, mismatches })
}

/// Run the simulation
pub fn simulate(wheel: &WheelConfig, sim: &SimConfig) -> SimResult<SimReport> {
    sim.validate()?;
    wheel.validate()?;

    log::info!(
        "Simulating {} spins of '{}' ({} items) in {} chunks, seed {}",
        sim.spins,
        wheel.name,
        wheel.items.len(),
        sim.chunks,
        sim.seed
    );

    let chunks: Vec<ChunkTally> = (0..sim.chunks)
        .into_par_iter()
        .map(|chunk| run_chunk(wheel, sim, chunk))
        .collect::<SimResult<_>>()?;

    let mut counts = vec![0u64; wheel.items.len()];
    let mut landing_mismatches = 0;
    for tally in &chunks {
        for (total, count) in counts.iter_mut().zip(&tally.counts) {
            *total += count;
        }
        landing_mismatches += tally.mismatches;
    }

    let shares = probabilities(&wheel.items);
    let (chi_square, degrees_of_freedom) = chi_square(&counts, &shares);

    let tallies = wheel
        .items
        .iter()
        .zip(shares.iter().zip(&counts))
        .map(|(item, (&expected_share, &observed))| ItemTally {
            id: item.id.clone(),
            label: item.label.clone(),
            weight: item.weight,
            expected_share,
            observed,
            observed_share: observed as f64 / sim.spins as f64,
        })
        .collect();

    if landing_mismatches > 0 {
        log::warn!("{} spins came to rest on the wrong segment", landing_mismatches);
    }

    Ok(SimReport {
        wheel: wheel.name.clone(),
        spins: sim.spins,
        seed: sim.seed,
        tallies,
        chi_square,
        degrees_of_freedom,
        landing_mismatches,
    })
}
