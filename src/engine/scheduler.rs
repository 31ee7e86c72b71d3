//! Fixed-step scheduler.
//!
//! Ticks are logical: no sleeping, no wall clock. Each tick increments the
//! world's counter, runs every system once in construction order and then
//! flushes the event bus. The first system error aborts the run.

use std::time::Instant;

use tracing::{debug, error, trace};

use crate::ecs::World;
use crate::error::SimResult;

/// Environment variable that turns on per-system timing logs
pub const PROFILE_ENV: &str = "ARENA_PROFILE";

/// One stage of the per-tick pipeline.
pub trait System: Send + Sync {
    fn name(&self) -> &'static str;

    /// Advance this system by one tick of `dt` seconds.
    fn run(&mut self, world: &mut World, dt: f64) -> SimResult<()>;
}

pub struct FixedStepScheduler {
    systems: Box<[Box<dyn System>]>,
    dt_ns: u64,
    profile: bool,
}

impl FixedStepScheduler {
    /// System order is fixed here and never changes afterwards.
    pub fn new(systems: Vec<Box<dyn System>>, dt_ns: u64) -> Self {
        let profile = std::env::var(PROFILE_ENV).is_ok_and(|v| v == "1");
        Self {
            systems: systems.into_boxed_slice(),
            dt_ns,
            profile,
        }
    }

    pub fn with_profiling(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn dt_ns(&self) -> u64 {
        self.dt_ns
    }

    pub fn dt_secs(&self) -> f64 {
        self.dt_ns as f64 / 1e9
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Execute exactly `ticks` ticks.
    pub fn run(&mut self, ticks: u64, world: &mut World) -> SimResult<()> {
        let dt = self.dt_secs();
        for _ in 0..ticks {
            world.tick += 1;
            trace!(tick = world.tick, "tick");
            for system in self.systems.iter_mut() {
                let started = self.profile.then(Instant::now);
                if let Err(err) = system.run(world, dt) {
                    error!(system = system.name(), tick = world.tick, error = %err, "System failed, aborting run");
                    return Err(err);
                }
                if let Some(started) = started {
                    debug!(
                        system = system.name(),
                        tick = world.tick,
                        micros = started.elapsed().as_micros() as u64,
                        "system timing"
                    );
                }
            }
            world.flush_events();
        }
        Ok(())
    }
}
