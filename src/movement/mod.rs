//! Movement: explicit Euler integration of velocities.
//!
//! Every entity with both a position and a velocity advances by
//! `velocity * dt`. Moving entities report one activity sample per tick so
//! stamina accounting sees the distance covered.

use std::sync::Arc;

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

use crate::actions::ActionId;
use crate::ecs::World;
use crate::engine::System;
use crate::error::SimResult;
use crate::events::ActivitySampleEvent;

pub mod collision;

pub use collision::{CollisionSystem, SpatialHash};

/// Locomotion action charged for plain movement
pub const WALK_ACTION: &str = "walk_step";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub DVec2);

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity(pub DVec2);

impl Velocity {
    pub fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }
}

/// Circle radius for collision, meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRadius(pub f64);

/// Velocity that circles `centre` counter-clockwise at `speed` m/s
pub fn orbit_velocity(position: DVec2, centre: DVec2, speed: f64) -> DVec2 {
    let radial = position - centre;
    let len = radial.length();
    if len == 0.0 {
        return DVec2::ZERO;
    }
    radial.perp() / len * speed
}

pub struct MovementSystem {
    action: ActionId,
}

impl MovementSystem {
    pub fn new() -> Self {
        Self::with_action(WALK_ACTION)
    }

    /// Charge movement to a different locomotion action
    pub fn with_action(action: &str) -> Self {
        Self {
            action: Arc::from(action),
        }
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn run(&mut self, world: &mut World, dt: f64) -> SimResult<()> {
        let tick = world.tick;
        let mut samples = Vec::new();
        for (id, velocity) in world.velocities.iter() {
            let Some(position) = world.positions.get_mut(id) else {
                continue;
            };
            let step = velocity.0 * dt;
            position.0 += step;
            if velocity.0 != DVec2::ZERO {
                samples.push(ActivitySampleEvent {
                    tick,
                    entity: id,
                    action_id: self.action.clone(),
                    distance_m: step.length(),
                });
            }
        }
        for sample in samples {
            world.events.post(sample);
        }
        Ok(())
    }
}
