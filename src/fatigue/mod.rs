//! Stamina drain and recovery.
//!
//! Every activity sample drains `stamina_cost / ticks` of its action. A fighter
//! that hits zero becomes exhausted until it recovers to a quarter of its
//! pool. Fighters with no activity this tick regenerate, slowed while their
//! morale is DESPERATE.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actions::StaminaReading;
use crate::constants::{
    DEFAULT_STAMINA_MAX, DEFAULT_STAMINA_REGEN, DESPERATE_REGEN_FACTOR, EXHAUSTION_CLEAR_FRACTION,
    STAMINA_SNAP_EPSILON,
};
use crate::ecs::World;
use crate::engine::System;
use crate::error::SimResult;
use crate::events::{ActivitySampleEvent, ExhaustionEvent};

pub mod morale;

pub use morale::{Morale, MoraleState, MoraleSystem};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamina {
    pub max: f64,
    pub current: f64,
    pub regen_per_tick: f64,
    pub exhausted: bool,
    /// At or below this, actions take the exhaustion time penalty
    pub exhaustion_threshold: f64,
    /// Last tick an activity sample drained this pool
    pub last_active_tick: Option<u64>,
}

impl Stamina {
    pub fn new(max: f64, regen_per_tick: f64) -> Self {
        Self {
            max,
            current: max,
            regen_per_tick,
            exhausted: false,
            exhaustion_threshold: 0.0,
            last_active_tick: None,
        }
    }

    pub fn reading(&self) -> StaminaReading {
        StaminaReading {
            current: self.current,
            exhaustion_threshold: self.exhaustion_threshold,
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Subtract `amount`, clamped at zero. Returns true on the first crossing into exhaustion.
    pub fn drain(&mut self, amount: f64) -> bool {
        self.current = (self.current - amount).max(0.0);
        if !self.exhausted && self.current <= 0.0 {
            self.exhausted = true;
            return true;
        }
        false
    }

    /// Add `amount`, capped at max. Clears exhaustion at a quarter of the pool.
    pub fn regenerate(&mut self, amount: f64) {
        self.current = (self.current + amount).min(self.max);
        if self.max - self.current < STAMINA_SNAP_EPSILON {
            self.current = self.max;
        }
        if self.exhausted && self.current >= EXHAUSTION_CLEAR_FRACTION * self.max {
            self.exhausted = false;
        }
    }
}

impl Default for Stamina {
    fn default() -> Self {
        Self::new(DEFAULT_STAMINA_MAX, DEFAULT_STAMINA_REGEN)
    }
}

/// Drains activity samples into stamina loss.
#[derive(Debug, Default)]
pub struct FatigueSystem;

impl System for FatigueSystem {
    fn name(&self) -> &'static str {
        "fatigue"
    }

    fn run(&mut self, world: &mut World, _dt: f64) -> SimResult<()> {
        let tick = world.tick;
        let catalogue = Arc::clone(&world.catalogue);
        let mut exhausted = Vec::new();

        for sample in world.events.drain::<ActivitySampleEvent>() {
            let Some(stamina) = world.stamina.get_mut(sample.entity) else {
                continue;
            };
            let spec = catalogue.get(&sample.action_id)?;
            let drain = spec.stamina_cost / spec.ticks.max(1) as f64;
            stamina.last_active_tick = Some(tick);
            if stamina.drain(drain) {
                debug!(tick, entity = %sample.entity, "exhausted");
                exhausted.push(ExhaustionEvent {
                    tick,
                    entity: sample.entity,
                });
            }
        }

        for event in exhausted {
            world.events.post(event);
        }
        Ok(())
    }
}

/// Regenerates stamina for fighters idle this tick.
#[derive(Debug, Default)]
pub struct RecoverySystem;

impl System for RecoverySystem {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn run(&mut self, world: &mut World, _dt: f64) -> SimResult<()> {
        let tick = world.tick;
        for (id, stamina) in world.stamina.iter_mut() {
            if stamina.last_active_tick == Some(tick) {
                continue;
            }
            if !world.vitals.get(id).map_or(true, |v| v.alive) {
                continue;
            }
            let desperate = world
                .morale
                .get(id)
                .is_some_and(|m| m.state() == MoraleState::Desperate);
            let factor = if desperate { DESPERATE_REGEN_FACTOR } else { 1.0 };
            stamina.regenerate(stamina.regen_per_tick * factor);
        }
        Ok(())
    }
}
