use std::time::Duration;

use bevy::prelude::*;
use tracing::error;

use crate::arena::{spawn_duel, DEFAULT_RADIUS, DEFAULT_SEPARATION};
use crate::engine::config::SimConfig;
use crate::engine::simulation::Simulation;
use crate::error::SimResult;

/// Drives a `Simulation` one tick per `FixedUpdate`, with the fixed
/// timestep set to the configured tick duration.
pub struct ArenaPlugin {
    config: SimConfig,
    spawn_duel: bool,
}

impl ArenaPlugin {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            spawn_duel: false,
        }
    }

    /// Start with the stock maul duel already spawned
    pub fn with_duel(mut self) -> Self {
        self.spawn_duel = true;
        self
    }

    fn build_simulation(&self) -> SimResult<Simulation> {
        let mut sim = Simulation::new(self.config.clone())?;
        if self.spawn_duel {
            spawn_duel(sim.world_mut(), DEFAULT_SEPARATION, DEFAULT_RADIUS)?;
        }
        Ok(sim)
    }
}

impl Plugin for ArenaPlugin {
    fn build(&self, app: &mut App) {
        let sim = match self.build_simulation() {
            Ok(sim) => sim,
            Err(err) => {
                error!(error = %err, "Arena simulation could not be built");
                return;
            }
        };
        app.insert_resource(Time::<Fixed>::from_duration(Duration::from_nanos(
            self.config.dt_ns,
        )))
        .insert_resource(ArenaSimulation::new(sim))
        .add_systems(FixedUpdate, arena_tick_system);
    }
}

#[derive(Resource)]
pub struct ArenaSimulation {
    pub sim: Simulation,
    halted: bool,
    last_error: Option<String>,
}

impl ArenaSimulation {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            halted: false,
            last_error: None,
        }
    }

    /// True once a system error stopped the run
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

fn arena_tick_system(mut arena: ResMut<ArenaSimulation>) {
    if arena.halted {
        return;
    }
    if let Err(err) = arena.sim.step() {
        error!(tick = arena.sim.tick(), error = %err, "Arena simulation halted");
        arena.halted = true;
        arena.last_error = Some(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ActivitySampleEvent;
    use std::sync::Arc;

    #[test]
    fn test_fixed_update_steps_simulation() {
        let mut app = App::new();
        app.add_plugins(ArenaPlugin::new(SimConfig::default()).with_duel());
        app.world_mut().run_schedule(FixedUpdate);
        app.world_mut().run_schedule(FixedUpdate);

        let arena = app.world().resource::<ArenaSimulation>();
        assert_eq!(arena.sim.tick(), 2);
        assert_eq!(arena.sim.world().positions.len(), 2);
        assert!(!arena.is_halted());

        let step = app.world().resource::<Time<Fixed>>().timestep();
        assert_eq!(step, Duration::from_millis(20));
    }

    #[test]
    fn test_system_error_halts() {
        let mut app = App::new();
        app.add_plugins(ArenaPlugin::new(SimConfig::default()));
        {
            let mut arena = app.world_mut().resource_mut::<ArenaSimulation>();
            let world = arena.sim.world_mut();
            let id = world.spawn();
            world.stamina.add(id, Default::default());
            world.events.post(ActivitySampleEvent {
                tick: 0,
                entity: id,
                action_id: Arc::from("cartwheel"),
                distance_m: 0.0,
            });
        }
        app.world_mut().run_schedule(FixedUpdate);
        app.world_mut().run_schedule(FixedUpdate);

        let arena = app.world().resource::<ArenaSimulation>();
        assert!(arena.is_halted());
        assert_eq!(arena.sim.tick(), 1);
        assert!(arena.last_error().unwrap().contains("cartwheel"));
    }
}
