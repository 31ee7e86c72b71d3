//! Monte-Carlo balance batches
//!
//! Runs many seeded duels in parallel with rayon and tallies how they end.
//! Each bout owns its own `World` and RNG, so a batch is as deterministic as
//! a single bout. A `BalanceBaseline` pins the action table hash a batch was
//! run against; checking it later turns a silent table edit into an error.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::info;

use crate::actions::ActionCatalogue;
use crate::arena::{spawn_duel, DEFAULT_RADIUS, DEFAULT_SEPARATION};
use crate::digest::finish_hex;
use crate::engine::{BoutOutcome, BoutResolution, SimConfig, Simulation};
use crate::error::{SimError, SimResult};
use crate::logging::TimingSpan;

/// Seed of bout `index` in a batch: first 8 bytes of SHA3(base_seed || index).
pub fn bout_seed(base_seed: u64, index: u64) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// One stock duel under `config` with its seed replaced by `seed`.
pub fn run_duel(config: &SimConfig, catalogue: Arc<ActionCatalogue>, seed: u64) -> SimResult<BoutOutcome> {
    let mut sim = Simulation::with_catalogue(config.clone().with_seed(seed), catalogue)?;
    spawn_duel(sim.world_mut(), DEFAULT_SEPARATION, DEFAULT_RADIUS)?;
    sim.run_bout()
}

/// Results of a batch of bouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub bouts: u64,
    pub base_seed: u64,
    /// Death count per cause name
    pub deaths: BTreeMap<String, u64>,
    /// Surrender count per cause name
    pub surrenders: BTreeMap<String, u64>,
    pub timeouts: u64,
    pub mean_ticks: f64,
    pub catalogue_hash: String,
    /// SHA3 over every bout fingerprint in seed order
    pub batch_fingerprint: String,
}

impl BatchReport {
    fn from_outcomes(base_seed: u64, catalogue_hash: &str, outcomes: &[BoutOutcome]) -> Self {
        let mut deaths = BTreeMap::new();
        let mut surrenders = BTreeMap::new();
        let mut timeouts = 0;
        let mut hasher = Sha3_256::new();

        for outcome in outcomes {
            match outcome.resolution {
                BoutResolution::Death { cause, .. } => {
                    *deaths.entry(cause.as_str().to_string()).or_insert(0) += 1;
                }
                BoutResolution::Surrender { cause, .. } => {
                    *surrenders.entry(cause.as_str().to_string()).or_insert(0) += 1;
                }
                BoutResolution::Timeout => timeouts += 1,
            }
            hasher.update(outcome.fingerprint.as_bytes());
        }

        let mean_ticks = if outcomes.is_empty() {
            0.0
        } else {
            outcomes.iter().map(|o| o.tick as f64).sum::<f64>() / outcomes.len() as f64
        };

        Self {
            bouts: outcomes.len() as u64,
            base_seed,
            deaths,
            surrenders,
            timeouts,
            mean_ticks,
            catalogue_hash: catalogue_hash.to_string(),
            batch_fingerprint: finish_hex(hasher),
        }
    }

    pub fn resolved(&self) -> u64 {
        self.deaths.values().sum::<u64>() + self.surrenders.values().sum::<u64>()
    }
}

/// Run `bouts` stock duels in parallel, seeds derived from `config.seed`.
pub fn run_batch(config: &SimConfig, bouts: u64) -> SimResult<BatchReport> {
    config.validate()?;
    let catalogue = Arc::new(match &config.catalogue_path {
        Some(path) => ActionCatalogue::from_path(path)?,
        None => ActionCatalogue::builtin()?,
    });
    run_batch_with_catalogue(config, catalogue, bouts)
}

pub fn run_batch_with_catalogue(
    config: &SimConfig,
    catalogue: Arc<ActionCatalogue>,
    bouts: u64,
) -> SimResult<BatchReport> {
    let _timing = TimingSpan::new("balance_batch");
    let outcomes = (0..bouts)
        .into_par_iter()
        .map(|i| run_duel(config, Arc::clone(&catalogue), bout_seed(config.seed, i)))
        .collect::<SimResult<Vec<_>>>()?;

    let report = BatchReport::from_outcomes(config.seed, catalogue.version_hash(), &outcomes);
    info!(
        bouts = report.bouts,
        resolved = report.resolved(),
        timeouts = report.timeouts,
        mean_ticks = report.mean_ticks,
        "Balance batch finished"
    );
    Ok(report)
}

/// Stored expectation for regression suites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceBaseline {
    pub catalogue_hash: String,
    pub report: Option<BatchReport>,
}

impl BalanceBaseline {
    pub fn from_report(report: &BatchReport) -> Self {
        Self {
            catalogue_hash: report.catalogue_hash.clone(),
            report: Some(report.clone()),
        }
    }

    pub fn for_catalogue(catalogue: &ActionCatalogue) -> Self {
        Self {
            catalogue_hash: catalogue.version_hash().to_string(),
            report: None,
        }
    }

    /// Any change to the action table must be re-baselined explicitly.
    pub fn check(&self, catalogue: &ActionCatalogue) -> SimResult<()> {
        if self.catalogue_hash != catalogue.version_hash() {
            return Err(SimError::BalanceDrift {
                expected: self.catalogue_hash.clone(),
                actual: catalogue.version_hash().to_string(),
            });
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::BUILTIN_ACTIONS;

    fn small_config() -> SimConfig {
        SimConfig {
            max_bout_ticks: 3_000,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_bout_seeds_are_stable_and_distinct() {
        assert_eq!(bout_seed(42, 0), bout_seed(42, 0));
        assert_ne!(bout_seed(42, 0), bout_seed(42, 1));
        assert_ne!(bout_seed(42, 0), bout_seed(43, 0));
    }

    #[test]
    fn test_batch_counts_every_bout() {
        let report = run_batch(&small_config(), 6).unwrap();
        assert_eq!(report.bouts, 6);
        assert_eq!(report.resolved() + report.timeouts, 6);
        assert!(report.mean_ticks > 0.0);
        assert_eq!(report.catalogue_hash.len(), 64);
    }

    #[test]
    fn test_batch_is_deterministic() {
        let a = run_batch(&small_config(), 4).unwrap();
        let b = run_batch(&small_config(), 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_batch() {
        let report = run_batch(&small_config(), 0).unwrap();
        assert_eq!(report.bouts, 0);
        assert_eq!(report.mean_ticks, 0.0);
    }

    #[test]
    fn test_baseline_detects_table_change() {
        let builtin = ActionCatalogue::builtin().unwrap();
        let baseline = BalanceBaseline::for_catalogue(&builtin);
        assert!(baseline.check(&builtin).is_ok());

        let edited = BUILTIN_ACTIONS.replacen("\"stam\": 4", "\"stam\": 5", 1);
        assert_ne!(edited, BUILTIN_ACTIONS);
        let edited = ActionCatalogue::from_json(&edited).unwrap();
        let err = baseline.check(&edited).unwrap_err();
        assert!(matches!(err, SimError::BalanceDrift { .. }));
    }
}
