//! arena-sim: run a stock duel, or a batch of them, from the command line.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use arena_core::arena::{spawn_duel, DEFAULT_RADIUS, DEFAULT_SEPARATION};
use arena_core::balance::{run_batch, BalanceBaseline};
use arena_core::logging::{init_tracing, LogLevel, TracingConfig};
use arena_core::{SimConfig, Simulation};

/// Deterministic melee arena simulator
#[derive(Parser, Debug)]
#[command(name = "arena-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON simulation config (defaults apply to missing fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Run a parallel batch of this many bouts instead of one
    #[arg(short, long)]
    bouts: Option<u64>,

    /// Write the final snapshot (single bout) or report (batch) as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Balance baseline to check the action table against; created if missing
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&TracingConfig::at_level(LogLevel::from_verbosity(args.verbose)));

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    match args.bouts {
        Some(bouts) => run_batch_command(&config, bouts, &args),
        None => run_single(config, &args),
    }
}

fn run_single(config: SimConfig, args: &Args) -> Result<()> {
    let mut sim = Simulation::new(config).context("building simulation")?;
    check_baseline(args, &sim)?;
    spawn_duel(sim.world_mut(), DEFAULT_SEPARATION, DEFAULT_RADIUS)?;

    let outcome = sim.run_bout().context("running bout")?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(path) = &args.output {
        std::fs::write(path, sim.snapshot().to_json()?)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), "Snapshot written");
    }
    Ok(())
}

fn run_batch_command(config: &SimConfig, bouts: u64, args: &Args) -> Result<()> {
    if args.baseline.is_some() {
        let sim = Simulation::new(config.clone()).context("building simulation")?;
        check_baseline(args, &sim)?;
    }
    let report = run_batch(config, bouts).context("running batch")?;
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);

    if let Some(path) = &args.output {
        std::fs::write(path, &json).with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(())
}

fn check_baseline(args: &Args, sim: &Simulation) -> Result<()> {
    let Some(path) = &args.baseline else {
        return Ok(());
    };
    let catalogue = &sim.world().catalogue;
    if path.exists() {
        BalanceBaseline::load(path)?
            .check(catalogue)
            .context("action table differs from baseline; re-baseline deliberately")?;
        info!(path = %path.display(), "Baseline matches");
    } else {
        BalanceBaseline::for_catalogue(catalogue).save(path)?;
        info!(path = %path.display(), "Baseline written");
    }
    Ok(())
}
