//! Owned world plus the standard system pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::SimConfig;
use super::messages::ArenaSnapshot;
use super::scheduler::{FixedStepScheduler, System};
use crate::actions::ActionCatalogue;
use crate::combat::AttackSystem;
use crate::ecs::{EntityId, World};
use crate::error::SimResult;
use crate::events::{DeathCause, SimEvent, SurrenderCause};
use crate::fatigue::{FatigueSystem, MoraleSystem, RecoverySystem};
use crate::health::{BleedSystem, DamageSystem};
use crate::logging::TimingSpan;
use crate::movement::{CollisionSystem, MovementSystem};

/// The fixed per-tick order: Movement, Collision, Attack, Damage, Bleed,
/// Fatigue, Recovery, Morale.
pub fn standard_systems(config: &SimConfig) -> Vec<Box<dyn System>> {
    vec![
        Box::new(MovementSystem::new()),
        Box::new(CollisionSystem::new(config.arena_radius, config.collision_passes)),
        Box::new(AttackSystem::new(config.autoswing_interval)),
        Box::new(DamageSystem),
        Box::new(BleedSystem),
        Box::new(FatigueSystem),
        Box::new(RecoverySystem),
        Box::new(MoraleSystem),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum BoutResolution {
    Death { entity: EntityId, cause: DeathCause },
    Surrender { entity: EntityId, cause: SurrenderCause },
    Timeout,
}

impl BoutResolution {
    /// First death or surrender among `events`
    fn from_events(events: &[SimEvent]) -> Option<Self> {
        events.iter().find_map(|event| match event {
            SimEvent::Death(e) => Some(BoutResolution::Death {
                entity: e.entity,
                cause: e.cause,
            }),
            SimEvent::Surrender(e) => Some(BoutResolution::Surrender {
                entity: e.entity,
                cause: e.cause,
            }),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoutOutcome {
    pub resolution: BoutResolution,
    pub tick: u64,
    /// Journal digest, empty-journal digest when recording is off
    pub fingerprint: String,
    pub catalogue_hash: String,
}

pub struct Simulation {
    config: SimConfig,
    world: World,
    scheduler: FixedStepScheduler,
}

impl Simulation {
    /// Loads the catalogue from `config.catalogue_path`, or the built-in table.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let catalogue = match &config.catalogue_path {
            Some(path) => ActionCatalogue::from_path(path)?,
            None => ActionCatalogue::builtin()?,
        };
        Self::with_catalogue(config, Arc::new(catalogue))
    }

    pub fn with_catalogue(config: SimConfig, catalogue: Arc<ActionCatalogue>) -> SimResult<Self> {
        config.validate()?;
        let mut world = World::new(config.seed, catalogue);
        world.events.set_recording(config.record_journal);
        let scheduler = FixedStepScheduler::new(standard_systems(&config), config.dt_ns);
        Ok(Self {
            config,
            world,
            scheduler,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Spawning and setup happen through here before the first step.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tick(&self) -> u64 {
        self.world.tick
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.scheduler.system_names()
    }

    pub fn step(&mut self) -> SimResult<()> {
        self.scheduler.run(1, &mut self.world)
    }

    pub fn run(&mut self, ticks: u64) -> SimResult<()> {
        self.scheduler.run(ticks, &mut self.world)
    }

    /// Step until a tick ends with a death or surrender, or `max_bout_ticks` elapse.
    pub fn run_bout(&mut self) -> SimResult<BoutOutcome> {
        let _timing = TimingSpan::new("bout");
        let start = self.world.tick;
        info!(
            seed = self.config.seed,
            fighters = self.world.positions.len(),
            max_ticks = self.config.max_bout_ticks,
            "Bout started"
        );

        let mut resolution = BoutResolution::Timeout;
        while self.world.tick - start < self.config.max_bout_ticks {
            self.step()?;
            if let Some(found) = BoutResolution::from_events(self.world.events.last_tick()) {
                resolution = found;
                break;
            }
        }

        let outcome = BoutOutcome {
            resolution,
            tick: self.world.tick,
            fingerprint: self.world.events.journal_fingerprint(),
            catalogue_hash: self.world.catalogue.version_hash().to_string(),
        };
        info!(tick = outcome.tick, resolution = ?outcome.resolution, "Bout finished");
        Ok(outcome)
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot::capture(&self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{spawn_duel, DEFAULT_RADIUS, DEFAULT_SEPARATION};
    use crate::error::SimError;

    fn duel(seed: u64) -> Simulation {
        let mut sim = Simulation::new(SimConfig::default().with_seed(seed)).unwrap();
        spawn_duel(sim.world_mut(), DEFAULT_SEPARATION, DEFAULT_RADIUS).unwrap();
        sim
    }

    #[test]
    fn test_standard_order() {
        let sim = Simulation::new(SimConfig::default()).unwrap();
        assert_eq!(
            sim.system_names(),
            vec!["movement", "collision", "attack", "damage", "bleed", "fatigue", "recovery", "morale"]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            collision_passes: 0,
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::new(config), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_step_and_run_advance_ticks() {
        let mut sim = duel(1);
        sim.step().unwrap();
        sim.run(9).unwrap();
        assert_eq!(sim.tick(), 10);
        let snap = sim.snapshot();
        assert_eq!(snap.tick, 10);
        assert_eq!(snap.fighters.len(), 2);
    }

    #[test]
    fn test_bout_resolves_before_budget() {
        let mut sim = duel(42);
        let outcome = sim.run_bout().unwrap();
        assert_ne!(outcome.resolution, BoutResolution::Timeout);
        assert!(outcome.tick < sim.config().max_bout_ticks);
        assert_eq!(outcome.fingerprint.len(), 64);
        assert_eq!(outcome.catalogue_hash, sim.world().catalogue.version_hash());
    }

    #[test]
    fn test_timeout_without_opponents() {
        let config = SimConfig {
            max_bout_ticks: 50,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run_bout().unwrap();
        assert_eq!(outcome.resolution, BoutResolution::Timeout);
        assert_eq!(outcome.tick, 50);
    }

    #[test]
    fn test_resolution_json_shape() {
        let json = serde_json::to_string(&BoutResolution::Surrender {
            entity: EntityId(1),
            cause: SurrenderCause::LowMorale,
        })
        .unwrap();
        assert!(json.contains("\"resolution\":\"surrender\""));
        assert!(json.contains("low_morale"));
    }
}
