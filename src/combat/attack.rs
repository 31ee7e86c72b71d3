//! Auto-swing driver and active-phase hit detection.

use std::sync::Arc;

use bevy::math::DVec2;
use rand::Rng;
use tracing::{debug, trace};

use super::hitbox::{capsule_centre, heading, strike_speed, sweep_direction, swing_progress, touches};
use super::{AttackPhase, AttackState, PhaseTimings, Weapon};
use crate::actions::{ActionId, StaminaReading};
use crate::constants::DEFAULT_AUTOSWING_TICKS;
use crate::ecs::{EntityId, World};
use crate::engine::System;
use crate::error::SimResult;
use crate::events::{ActivitySampleEvent, ImpactEvent};
use crate::health::Region;

/// Starts a swing whenever an armed fighter is idle on a cadence tick, then
/// steps every attack state machine and resolves contacts.
pub struct AttackSystem {
    autoswing_interval: u64,
}

impl AttackSystem {
    pub fn new(autoswing_interval: u64) -> Self {
        Self {
            autoswing_interval: autoswing_interval.max(1),
        }
    }

    pub fn autoswing_interval(&self) -> u64 {
        self.autoswing_interval
    }

    /// Phase lengths for the next swing: catalogue timing scaled by the
    /// fighter's loadout, then shifted by any chain rule.
    fn plan_swing(
        world: &World,
        attacker: EntityId,
        target: EntityId,
        weapon: &Weapon,
        state: &AttackState,
    ) -> SimResult<(usize, PhaseTimings, ActionId)> {
        let (idx, profile) = weapon.profile_for_swing(state.swing_id);
        let mut timings = PhaseTimings::from_profile(profile);

        if let Some(loadout) = world.loadouts.get(attacker) {
            let stamina = world
                .stamina
                .get(attacker)
                .map_or(StaminaReading::fresh(), |s| s.reading());
            let effective = world.catalogue.effective_ticks(
                &profile.action_id,
                &loadout.armor_class,
                &weapon.encumbrance_class,
                stamina,
                loadout.coordination,
                loadout.perception,
            )?;
            timings = timings.scaled(effective as f64 / profile.total_ticks() as f64);
        }

        if let Some(previous) = &state.last_action {
            let distance = match (world.positions.get(attacker), world.positions.get(target)) {
                (Some(a), Some(b)) => a.0.distance(b.0),
                _ => f64::INFINITY,
            };
            let delta = world
                .catalogue
                .chain_windup_delta(previous, &profile.action_id, distance);
            timings = timings.with_windup_delta(delta);
        }

        Ok((idx, timings, Arc::clone(&profile.action_id)))
    }

    /// First segment, in declared order, touching the target this tick.
    fn detect_contact(
        world: &World,
        attacker: EntityId,
        target: EntityId,
        weapon: &Weapon,
        state: &AttackState,
    ) -> Option<(DVec2, String)> {
        let origin = world.positions.get(attacker)?.0;
        let target_pos = world.positions.get(target)?.0;
        let target_radius = world.radii.get(target).map_or(0.0, |r| r.0);
        let kind = weapon.profiles()[state.profile_idx].kind;

        let t = swing_progress(state.ticks_left, state.timings.active);
        let (direction, scale) = sweep_direction(kind, heading(origin, target_pos), t);
        weapon.segments().iter().find_map(|segment| {
            let centre = capsule_centre(origin, direction, scale, segment);
            touches(centre, segment.radius, target_pos, target_radius)
                .then(|| (centre, segment.tag.clone()))
        })
    }
}

impl Default for AttackSystem {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSWING_TICKS)
    }
}

impl System for AttackSystem {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn run(&mut self, world: &mut World, dt: f64) -> SimResult<()> {
        let tick = world.tick;
        let cadence = tick % self.autoswing_interval == 0;

        for id in world.weapons.ids() {
            world.attack_states.get_or_insert_with(id, AttackState::default);
        }

        for id in world.attack_states.ids() {
            let Some(weapon) = world.weapons.get(id).cloned() else {
                continue;
            };
            if !world.is_combatant(id) {
                continue;
            }
            let Some(state) = world.attack_states.get(id).cloned() else {
                continue;
            };

            if state.is_idle() {
                if !cadence {
                    continue;
                }
                let Some(target) = world.opponents.get(id).map(|o| o.0) else {
                    continue;
                };
                if !world.is_combatant(target) {
                    continue;
                }
                let (idx, timings, action_id) =
                    Self::plan_swing(world, id, target, &weapon, &state)?;
                debug!(
                    tick,
                    attacker = %id,
                    defender = %target,
                    action = %action_id,
                    windup = timings.windup,
                    active = timings.active,
                    recovery = timings.recovery,
                    "swing started"
                );
                if let Some(state) = world.attack_states.get_mut(id) {
                    state.begin_swing(target, idx, timings, action_id);
                }
                continue;
            }

            let Some(state) = world.attack_states.get_mut(id) else {
                continue;
            };
            if let Some(phase) = state.advance() {
                trace!(tick, attacker = %id, phase = phase.as_str(), "attack phase");
            }
            if state.phase != AttackPhase::Active || state.has_hit {
                continue;
            }
            let state = state.clone();
            let Some(target) = state.target else {
                continue;
            };
            if !world.is_combatant(target) {
                continue;
            }
            let Some((contact, tag)) = Self::detect_contact(world, id, target, &weapon, &state)
            else {
                continue;
            };

            let profile = &weapon.profiles()[state.profile_idx];
            let region = Region::ALL[world.rng.gen_range(0..Region::ALL.len())];
            let impact = ImpactEvent {
                tick,
                attacker: id,
                defender: target,
                swing_id: state.swing_id,
                contact,
                relative_speed: strike_speed(
                    profile.kind,
                    weapon.reach(),
                    state.timings.active,
                    dt,
                ),
                weapon_mass: weapon.mass_kg,
                edge: weapon.edge,
                contact_tag: tag,
                region,
            };
            debug!(
                tick,
                attacker = %id,
                defender = %target,
                tag = %impact.contact_tag,
                region = region.as_str(),
                speed = impact.relative_speed,
                "impact"
            );
            world.events.post(impact);
            world.events.post(ActivitySampleEvent {
                tick,
                entity: id,
                action_id: Arc::clone(&profile.action_id),
                distance_m: 0.0,
            });
            if let Some(state) = world.attack_states.get_mut(id) {
                state.has_hit = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionCatalogue;
    use crate::combat::{Loadout, Opponent};
    use crate::health::Vitals;
    use crate::movement::{CollisionRadius, Position};

    const DT: f64 = 0.02;

    fn duel(separation: f64) -> (World, EntityId, EntityId) {
        let catalogue = Arc::new(ActionCatalogue::builtin().unwrap());
        let mut w = World::new(21, Arc::clone(&catalogue));
        let maul = Arc::new(Weapon::maul(&catalogue).unwrap());
        let a = w.spawn();
        let b = w.spawn();
        w.positions.add(a, Position::new(0.0, 0.0));
        w.positions.add(b, Position::new(separation, 0.0));
        for (id, foe) in [(a, b), (b, a)] {
            w.radii.add(id, CollisionRadius(0.3));
            w.weapons.add(id, Arc::clone(&maul));
            w.opponents.add(id, Opponent(foe));
        }
        (w, a, b)
    }

    fn run_to(w: &mut World, system: &mut AttackSystem, last_tick: u64) {
        while w.tick < last_tick {
            w.tick += 1;
            system.run(w, DT).unwrap();
        }
    }

    fn impacts_by(w: &World, attacker: EntityId) -> Vec<ImpactEvent> {
        w.events
            .peek::<ImpactEvent>()
            .filter(|e| e.attacker == attacker)
            .cloned()
            .collect()
    }

    #[test]
    fn test_phase_timing_follows_profile() {
        let (mut w, a, _) = duel(10.0);
        let mut system = AttackSystem::default();

        run_to(&mut w, &mut system, 59);
        assert!(w.attack_states.get(a).unwrap().is_idle());

        // light_slash 5/3/5
        let expected = [
            (60, AttackPhase::Windup),
            (64, AttackPhase::Windup),
            (65, AttackPhase::Active),
            (67, AttackPhase::Active),
            (68, AttackPhase::Recovery),
            (72, AttackPhase::Recovery),
            (73, AttackPhase::Idle),
        ];
        for (tick, phase) in expected {
            run_to(&mut w, &mut system, tick);
            assert_eq!(w.attack_states.get(a).unwrap().phase, phase, "tick {}", tick);
        }
        assert_eq!(w.attack_states.get(a).unwrap().swing_id, 1);
    }

    #[test]
    fn test_chain_shortens_next_windup() {
        let (mut w, a, _) = duel(10.0);
        let mut system = AttackSystem::default();
        run_to(&mut w, &mut system, 120);
        let state = w.attack_states.get(a).unwrap();
        assert_eq!(state.last_action.as_deref(), Some("heavy_overhead"));
        // heavy_overhead windup 10, light_slash chain -2
        assert_eq!(state.timings.windup, 8);
        assert_eq!(state.ticks_left, 8);
    }

    #[test]
    fn test_loadout_scales_phases() {
        let (mut w, a, _) = duel(10.0);
        w.loadouts.add(a, Loadout::default());
        let mut system = AttackSystem::default();
        run_to(&mut w, &mut system, 60);
        // 13 ticks * heavy weapon 1.2 = 15.6 -> 16, factor 16/13
        let timings = w.attack_states.get(a).unwrap().timings;
        assert_eq!(timings.windup, 6);
        assert_eq!(timings.active, 4);
        assert_eq!(timings.recovery, 6);
    }

    #[test]
    fn test_one_impact_per_swing() {
        let (mut w, a, b) = duel(0.6);
        let mut system = AttackSystem::default();
        run_to(&mut w, &mut system, 73);

        let hits = impacts_by(&w, a);
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.tick, 65);
        assert_eq!(hit.defender, b);
        assert_eq!(hit.contact_tag, "strong_edge");
        assert_eq!(hit.swing_id, 0);
        assert!((hit.relative_speed - 1.2 * std::f64::consts::FRAC_PI_2 / 0.06).abs() < 1e-9);

        let samples: Vec<_> = w
            .events
            .peek::<ActivitySampleEvent>()
            .filter(|s| s.entity == a)
            .cloned()
            .collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].distance_m, 0.0);
        assert_eq!(&*samples[0].action_id, "light_slash");
    }

    #[test]
    fn test_out_of_reach_never_connects() {
        let (mut w, a, _) = duel(3.0);
        let mut system = AttackSystem::default();
        run_to(&mut w, &mut system, 240);
        assert!(impacts_by(&w, a).is_empty());
        assert_eq!(w.attack_states.get(a).unwrap().swing_id, 3);
    }

    #[test]
    fn test_dead_fighters_do_not_swing_or_get_hit() {
        let (mut w, a, b) = duel(0.6);
        let mut dead = Vitals::default();
        dead.alive = false;
        w.vitals.add(b, dead);
        let mut system = AttackSystem::default();
        run_to(&mut w, &mut system, 73);

        assert!(w.attack_states.get(a).unwrap().is_idle());
        assert!(w.attack_states.get(b).unwrap().is_idle());
        assert_eq!(w.events.pending_len(), 0);
    }

    #[test]
    fn test_interval_floor_is_one() {
        assert_eq!(AttackSystem::new(0).autoswing_interval(), 1);
    }
}
