//! Layered damage pipeline.
//!
//! Kinetic energy `0.5 * m * v^2` splits into crush and shear by the edge's
//! shear coefficient. Crush below the region's bone-break threshold bruises
//! skin and muscle; above it the excess breaks bone, and a fractured bone
//! lets each organ in the region take a knock-on hit. Independently the
//! strike penetrates the skin -> muscle -> bone -> organ stack to a depth set
//! by edge type and speed.

use rand::Rng;
use tracing::{debug, trace};

use super::{Anatomy, OrganKind, Region, Wounds};
use crate::combat::EdgeType;
use crate::constants::{
    BONE_HARDNESS, DEPTH_EPSILON, EXTERNAL_BLEED_RATE, FRACTURE_ORGAN_HIT_CHANCE, INTERNAL_BLEED_RATE,
    MUSCLE_BRUISE_SHARE, MUSCLE_ENERGY_PER_HP, SKIN_BRUISE_SHARE, SKIN_ENERGY_PER_HP,
};
use crate::ecs::World;
use crate::engine::System;
use crate::error::SimResult;
use crate::events::{DeathCause, DeathEvent, ImpactEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Skin,
    Muscle,
    Bone,
    Organ,
}

/// Tissue stack, outermost first, thickness in cm
pub const LAYER_STACK: [(Layer, f64); 4] = [
    (Layer::Skin, 0.2),
    (Layer::Muscle, 2.0),
    (Layer::Bone, 1.3),
    (Layer::Organ, 1.0),
];

pub fn stack_depth_cm() -> f64 {
    LAYER_STACK.iter().map(|(_, cm)| cm).sum()
}

/// What one strike did to a region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrikeReport {
    pub crush_j: f64,
    pub shear_j: f64,
    pub depth_cm: f64,
    pub bleeds_opened: usize,
    pub organ_failed: Option<OrganKind>,
}

/// Layer proportions within float residue of 1 count as the whole layer
fn full_within_epsilon(proportion: f64) -> f64 {
    if proportion >= 1.0 - DEPTH_EPSILON {
        1.0
    } else {
        proportion
    }
}

fn proportional(proportion: f64, max: u32) -> u32 {
    ((proportion * max as f64).ceil() as u32).max(1)
}

/// Apply one strike to `region`. `rng` picks organs and knock-on hits.
pub fn apply_strike(
    anatomy: &mut Anatomy,
    wounds: &mut Wounds,
    region: Region,
    kinetic_energy: f64,
    edge: EdgeType,
    speed: f64,
    rng: &mut impl Rng,
) -> StrikeReport {
    let energy = kinetic_energy.max(0.0);
    let shear = energy * edge.shear_coefficient();
    let crush = energy - shear;
    let mut report = StrikeReport {
        crush_j: crush,
        shear_j: shear,
        ..Default::default()
    };
    let bleeds_before = wounds.sources.len();
    let (limb, organs) = anatomy.region_mut(region);

    // Crush
    let threshold = region.bone_break_threshold();
    if crush < threshold {
        let skin = ((crush * SKIN_BRUISE_SHARE / SKIN_ENERGY_PER_HP) as u32).max(1);
        let muscle = ((crush * MUSCLE_BRUISE_SHARE / MUSCLE_ENERGY_PER_HP) as u32).max(1);
        limb.skin = limb.skin.saturating_sub(skin);
        limb.muscle = limb.muscle.saturating_sub(muscle);
    } else {
        let bone = (((crush - threshold) / BONE_HARDNESS).round_ties_even() as u32).max(1);
        limb.bone = limb.bone.saturating_sub(bone);
        if limb.is_fractured() {
            for organ in organs.iter_mut() {
                if rng.gen::<f64>() < FRACTURE_ORGAN_HIT_CHANCE {
                    organ.hp = organ.hp.saturating_sub(1);
                    let rate = organ.kind.catastrophic_bleed_rate().max(INTERNAL_BLEED_RATE);
                    wounds.open(region, rate, true);
                    if organ.has_failed() && report.organ_failed.is_none() {
                        report.organ_failed = Some(organ.kind);
                    }
                }
            }
        }
    }

    // Penetration
    let mut remaining = edge.penetration_fraction(speed) * stack_depth_cm();
    for (layer, thickness) in LAYER_STACK {
        if remaining <= DEPTH_EPSILON {
            break;
        }
        if layer == Layer::Organ && !organs.is_empty() {
            let organ = &mut organs[rng.gen_range(0..organs.len())];
            let proportion = full_within_epsilon(remaining / thickness);
            let dmg = ((proportion * organ.max_hp as f64) as u32).max(1);
            organ.hp = organ.hp.saturating_sub(dmg);
            let rate = organ
                .kind
                .catastrophic_bleed_rate()
                .max(INTERNAL_BLEED_RATE * dmg as f64 / organ.max_hp as f64);
            wounds.open(region, rate, true);
            report.depth_cm += remaining.min(thickness);
            if organ.has_failed() && report.organ_failed.is_none() {
                report.organ_failed = Some(organ.kind);
            }
            break;
        }

        let pool = remaining.min(thickness);
        let proportion = full_within_epsilon(pool / thickness);
        match layer {
            Layer::Skin => {
                let before = limb.skin;
                limb.skin = before.saturating_sub(proportional(proportion, limb.max_skin));
                if before > 0 && limb.skin == 0 {
                    wounds.open(region, EXTERNAL_BLEED_RATE * proportion, false);
                }
            }
            Layer::Muscle => {
                let before = limb.muscle;
                limb.muscle = before.saturating_sub(proportional(proportion, limb.max_muscle));
                if before > 0 && limb.muscle == 0 {
                    wounds.open(region, EXTERNAL_BLEED_RATE * proportion, false);
                }
            }
            Layer::Bone => {
                limb.bone = limb.bone.saturating_sub(proportional(proportion, limb.max_bone));
            }
            Layer::Organ => {}
        }
        report.depth_cm += pool;
        remaining -= pool;
    }

    report.bleeds_opened = wounds.sources.len() - bleeds_before;
    report
}

/// Applies impact events to defenders. Peeks, so morale can still count them.
#[derive(Debug, Default)]
pub struct DamageSystem;

impl System for DamageSystem {
    fn name(&self) -> &'static str {
        "damage"
    }

    fn run(&mut self, world: &mut World, _dt: f64) -> SimResult<()> {
        let impacts: Vec<ImpactEvent> = world.events.peek::<ImpactEvent>().cloned().collect();
        let mut deaths = Vec::new();

        for hit in impacts {
            let defender = hit.defender;
            if !world.vitals.get(defender).is_some_and(|v| v.alive) {
                continue;
            }
            let Some(anatomy) = world.anatomies.get_mut(defender) else {
                continue;
            };
            let wounds = world.wounds.get_or_insert_with(defender, Wounds::default);
            let report = apply_strike(
                anatomy,
                wounds,
                hit.region,
                hit.kinetic_energy(),
                hit.edge,
                hit.relative_speed,
                &mut world.rng,
            );
            trace!(
                tick = world.tick,
                attacker = %hit.attacker,
                defender = %defender,
                region = hit.region.as_str(),
                crush = report.crush_j,
                depth_cm = report.depth_cm,
                bleeds = report.bleeds_opened,
                "strike applied"
            );

            if let Some(organ) = report.organ_failed {
                if let Some(vitals) = world.vitals.get_mut(defender) {
                    if vitals.alive {
                        vitals.alive = false;
                        debug!(tick = world.tick, entity = %defender, organ = ?organ, "organ failure");
                        deaths.push(DeathEvent {
                            tick: world.tick,
                            entity: defender,
                            cause: DeathCause::OrganFailure,
                        });
                    }
                }
            }
        }

        for death in deaths {
            world.events.post(death);
        }
        Ok(())
    }
}
