//! wheel-sim — batch spin simulator
//!
//! Usage:
//!   wheel-sim                                  - simulate the default four-prize wheel
//!   wheel-sim --config wheel.yaml --spins 1000000  - simulate a saved wheel
//!   wheel-sim --json                           - print the report as JSON

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use pw_sim::{SimConfig, SimReport, Z_999, chi_square_critical, simulate};
use pw_wheel::WheelConfig;

#[derive(Parser)]
#[command(name = "wheel-sim", about = "Simulate prize wheel spins and check the weights")]
struct Cli {
    /// Wheel document (.json, .yaml, .yml); defaults to the starter wheel
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of spins
    #[arg(short, long, default_value_t = 100_000)]
    spins: u64,

    /// Base seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Parallel chunks (part of the reproducibility key)
    #[arg(long, default_value_t = 8)]
    chunks: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Exit with an error when the frequencies do not fit the weights
    #[arg(long)]
    strict: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let wheel = match &cli.config {
        Some(path) => WheelConfig::load(path)
            .with_context(|| format!("failed to load wheel from {}", path.display()))?,
        None => WheelConfig::default(),
    };

    let sim = SimConfig::default()
        .with_spins(cli.spins)
        .with_seed(cli.seed)
        .with_chunks(cli.chunks);

    let report = simulate(&wheel, &sim).context("simulation failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }

    if cli.strict && !report.fits_weights() {
        bail!(
            "observed frequencies do not fit the weights (χ² = {:.2}, {} mismatched landings)",
            report.chi_square,
            report.landing_mismatches
        );
    }
    Ok(())
}

fn print_table(report: &SimReport) {
    println!("Wheel: {}  ({} spins, seed {})", report.wheel, report.spins, report.seed);
    println!();
    println!(
        "{:<24} {:>10} {:>10} {:>12} {:>10}",
        "Item", "Weight", "Expected", "Observed", "Share"
    );
    for tally in &report.tallies {
        println!(
            "{:<24} {:>10.3} {:>9.3}% {:>12} {:>9.3}%",
            tally.label,
            tally.weight,
            tally.expected_share * 100.0,
            tally.observed,
            tally.observed_share * 100.0
        );
    }
    println!();
    println!(
        "χ² = {:.3} (df {}, 99.9% critical {:.3})",
        report.chi_square,
        report.degrees_of_freedom,
        chi_square_critical(report.degrees_of_freedom, Z_999)
    );
    println!("Landing mismatches: {}", report.landing_mismatches);
    println!(
        "Verdict: {}",
        if report.fits_weights() { "fits weights" } else { "DOES NOT FIT" }
    );
}
