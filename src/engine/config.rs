use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ARENA_RADIUS, DEFAULT_AUTOSWING_TICKS, DEFAULT_COLLISION_PASSES, DEFAULT_DT_NS,
    DEFAULT_MAX_BOUT_TICKS,
};
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub dt_ns: u64,
    pub arena_radius: f64,
    pub autoswing_interval: u64,
    pub collision_passes: u32,
    pub record_journal: bool,
    pub max_bout_ticks: u64,
    /// Action table to load instead of the built-in one
    pub catalogue_path: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dt_ns: DEFAULT_DT_NS,
            arena_radius: ARENA_RADIUS,
            autoswing_interval: DEFAULT_AUTOSWING_TICKS,
            collision_passes: DEFAULT_COLLISION_PASSES,
            record_journal: true,
            max_bout_ticks: DEFAULT_MAX_BOUT_TICKS,
            catalogue_path: None,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn dt_secs(&self) -> f64 {
        self.dt_ns as f64 / 1e9
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.dt_ns == 0 {
            return Err(SimError::InvalidConfig("dt_ns must be positive".into()));
        }
        if self.arena_radius.is_nan() || self.arena_radius <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "arena_radius must be positive, got {}",
                self.arena_radius
            )));
        }
        if self.autoswing_interval == 0 {
            return Err(SimError::InvalidConfig("autoswing_interval must be positive".into()));
        }
        if self.collision_passes == 0 {
            return Err(SimError::InvalidConfig("collision_passes must be at least 1".into()));
        }
        if self.max_bout_ticks == 0 {
            return Err(SimError::InvalidConfig("max_bout_ticks must be positive".into()));
        }
        Ok(())
    }
}
