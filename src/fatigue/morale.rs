//! Morale shocks and surrender.
//!
//! Per tick each fighter collects signed deltas from impacts, deaths,
//! exhaustion and blood loss. The integer value moves by the floored sum and
//! the fractional rest carries into the next tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    MORALE_BLOOD_EROSION, MORALE_DEATH, MORALE_EXHAUSTION, MORALE_IMPACT_ATTACKER,
    MORALE_IMPACT_DEFENDER, MORALE_MAX, SURRENDER_FLOOR,
};
use crate::ecs::{EntityId, World};
use crate::engine::System;
use crate::error::SimResult;
use crate::events::{DeathEvent, ExhaustionEvent, ImpactEvent, SurrenderCause, SurrenderEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoraleState {
    Desperate,
    Fractured,
    Uncertain,
    Composed,
    Determined,
}

impl MoraleState {
    pub fn from_value(value: i32) -> Self {
        match value {
            v if v >= 90 => MoraleState::Determined,
            v if v >= 65 => MoraleState::Composed,
            v if v >= 40 => MoraleState::Uncertain,
            v if v >= 15 => MoraleState::Fractured,
            _ => MoraleState::Desperate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoraleState::Desperate => "DESPERATE",
            MoraleState::Fractured => "FRACTURED",
            MoraleState::Uncertain => "UNCERTAIN",
            MoraleState::Composed => "COMPOSED",
            MoraleState::Determined => "DETERMINED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morale {
    pub value: i32,
    /// Fractional remainder in [0, 1) not yet folded into `value`
    pub carry: f64,
    pub surrendered: bool,
}

impl Morale {
    pub fn new(value: i32) -> Self {
        Self {
            value: value.clamp(0, MORALE_MAX),
            carry: 0.0,
            surrendered: false,
        }
    }

    pub fn state(&self) -> MoraleState {
        MoraleState::from_value(self.value)
    }

    pub fn apply_delta(&mut self, delta: f64) {
        let exact = self.value as f64 + self.carry + delta;
        let floor = exact.floor();
        if floor < 0.0 {
            self.value = 0;
            self.carry = 0.0;
        } else if floor >= MORALE_MAX as f64 {
            self.value = MORALE_MAX;
            self.carry = 0.0;
        } else {
            self.value = floor as i32;
            self.carry = exact - floor;
        }
    }
}

impl Default for Morale {
    fn default() -> Self {
        Self::new(MORALE_MAX)
    }
}

#[derive(Debug, Default)]
pub struct MoraleSystem;

impl System for MoraleSystem {
    fn name(&self) -> &'static str {
        "morale"
    }

    fn run(&mut self, world: &mut World, _dt: f64) -> SimResult<()> {
        let tick = world.tick;
        let mut deltas: BTreeMap<EntityId, f64> = BTreeMap::new();

        for impact in world.events.drain::<ImpactEvent>() {
            *deltas.entry(impact.attacker).or_default() += MORALE_IMPACT_ATTACKER;
            *deltas.entry(impact.defender).or_default() += MORALE_IMPACT_DEFENDER;
        }
        for death in world.events.drain::<DeathEvent>() {
            *deltas.entry(death.entity).or_default() += MORALE_DEATH;
        }
        for exhaustion in world.events.drain::<ExhaustionEvent>() {
            *deltas.entry(exhaustion.entity).or_default() += MORALE_EXHAUSTION;
        }
        for (id, vitals) in world.vitals.iter() {
            let lost = vitals.blood_lost_pct();
            if lost > 0.0 {
                *deltas.entry(id).or_default() -= MORALE_BLOOD_EROSION * lost;
            }
        }

        let mut surrenders = Vec::new();
        for (id, morale) in world.morale.iter_mut() {
            if let Some(delta) = deltas.get(&id) {
                morale.apply_delta(*delta);
            }
            if morale.surrendered || morale.state() != MoraleState::Desperate {
                continue;
            }
            if !world.vitals.get(id).map_or(true, |v| v.alive) {
                continue;
            }
            let exhausted = world.stamina.get(id).is_some_and(|s| s.exhausted);
            let projected = morale.value as f64 + MORALE_EXHAUSTION;
            if exhausted || projected < SURRENDER_FLOOR {
                let cause = if exhausted {
                    SurrenderCause::Exhaustion
                } else {
                    SurrenderCause::LowMorale
                };
                morale.surrendered = true;
                debug!(tick, entity = %id, cause = cause.as_str(), "surrender");
                surrenders.push(SurrenderEvent {
                    tick,
                    entity: id,
                    cause,
                });
            }
        }

        for event in surrenders {
            world.events.post(event);
        }
        Ok(())
    }
}
