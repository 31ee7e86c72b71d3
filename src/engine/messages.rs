use serde::{Deserialize, Serialize};

use crate::ecs::{EntityId, World};
use crate::error::SimResult;
use crate::events::SimEvent;

// =====================================================
// Read-only telemetry for presentation hosts
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2Msg {
    pub x: f64,
    pub y: f64,
}

impl From<bevy::math::DVec2> for Vec2Msg {
    fn from(v: bevy::math::DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterSnapshot {
    pub entity: EntityId,
    pub position: Vec2Msg,
    pub attack_phase: String,
    pub stamina: f64,
    pub exhausted: bool,
    pub morale: i32,
    pub morale_state: String,
    pub blood_ml: f64,
    pub alive: bool,
    pub surrendered: bool,
    pub fractured_limbs: usize,
    pub bleed_rate_ml_s: f64,
}

impl FighterSnapshot {
    /// Missing components read as their fresh defaults.
    pub fn capture(world: &World, entity: EntityId) -> Self {
        let stamina = world.stamina.get(entity);
        let morale = world.morale.get(entity);
        let vitals = world.vitals.get(entity);
        Self {
            entity,
            position: world
                .positions
                .get(entity)
                .map(|p| p.0.into())
                .unwrap_or(Vec2Msg { x: 0.0, y: 0.0 }),
            attack_phase: world
                .attack_states
                .get(entity)
                .map_or("idle", |s| s.phase.as_str())
                .to_string(),
            stamina: stamina.map_or(0.0, |s| s.current),
            exhausted: stamina.is_some_and(|s| s.exhausted),
            morale: morale.map_or(0, |m| m.value),
            morale_state: morale.map_or("", |m| m.state().as_str()).to_string(),
            blood_ml: vitals.map_or(0.0, |v| v.blood_ml),
            alive: world.is_alive(entity),
            surrendered: world.has_surrendered(entity),
            fractured_limbs: world.anatomies.get(entity).map_or(0, |a| a.fractured_count()),
            bleed_rate_ml_s: world.wounds.get(entity).map_or(0.0, |w| w.total_rate()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub tick: u64,
    pub fighters: Vec<FighterSnapshot>,
    /// Events flushed at the end of `tick`
    pub events: Vec<SimEvent>,
}

impl ArenaSnapshot {
    /// One entry per positioned entity, in id order.
    pub fn capture(world: &World) -> Self {
        Self {
            tick: world.tick,
            fighters: world
                .positions
                .ids()
                .into_iter()
                .map(|id| FighterSnapshot::capture(world, id))
                .collect(),
            events: world.events.last_tick().to_vec(),
        }
    }

    pub fn fighter(&self, entity: EntityId) -> Option<&FighterSnapshot> {
        self.fighters.iter().find(|f| f.entity == entity)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionCatalogue;
    use crate::fatigue::{Morale, Stamina};
    use crate::health::{Anatomy, Vitals};
    use crate::movement::Position;
    use std::sync::Arc;

    #[test]
    fn test_capture_reads_components() {
        let mut w = World::new(3, Arc::new(ActionCatalogue::builtin().unwrap()));
        let a = w.spawn();
        w.positions.add(a, Position::new(1.5, -2.0));
        w.stamina.add(a, Stamina::default());
        w.morale.add(a, Morale::new(70));
        w.vitals.add(a, Vitals::default());
        w.anatomies.add(a, Anatomy::human());
        let bare = w.spawn();
        w.positions.add(bare, Position::new(0.0, 0.0));
        w.spawn();

        let snap = ArenaSnapshot::capture(&w);
        assert_eq!(snap.fighters.len(), 2);
        let f = snap.fighter(a).unwrap();
        assert_eq!(f.position, Vec2Msg { x: 1.5, y: -2.0 });
        assert_eq!(f.attack_phase, "idle");
        assert_eq!(f.stamina, 100.0);
        assert_eq!(f.morale_state, "COMPOSED");
        assert_eq!(f.blood_ml, 5000.0);
        assert_eq!(f.fractured_limbs, 1);
        assert!(f.alive && !f.surrendered);

        let b = snap.fighter(bare).unwrap();
        assert!(b.alive);
        assert_eq!(b.morale_state, "");
    }

    #[test]
    fn test_to_json_names_fields() {
        let w = World::new(3, Arc::new(ActionCatalogue::builtin().unwrap()));
        let json = ArenaSnapshot::capture(&w).to_json().unwrap();
        assert!(json.contains("\"tick\": 0"));
        assert!(json.contains("\"fighters\": []"));
    }
}
