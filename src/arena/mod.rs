//! Spawn blueprints: fully equipped fighters, the stock duel and crowds.

use std::f64::consts::TAU;
use std::sync::Arc;

use bevy::math::DVec2;

use crate::combat::{Loadout, Opponent, Weapon};
use crate::constants::DEFAULT_BLOOD_ML;
use crate::ecs::{EntityId, World};
use crate::error::SimResult;
use crate::fatigue::{Morale, Stamina};
use crate::health::{Anatomy, Vitals, Wounds};
use crate::movement::{orbit_velocity, CollisionRadius, Position, Velocity};

/// Fighters start this far apart so the maul arcs overlap on the first swing
pub const DEFAULT_SEPARATION: f64 = 0.30;

pub const DEFAULT_RADIUS: f64 = 0.30;

#[derive(Debug, Clone)]
pub struct FighterSpec {
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
    pub weapon: Option<Arc<Weapon>>,
    pub loadout: Option<Loadout>,
    pub stamina: Stamina,
    pub morale: i32,
    pub blood_ml: f64,
}

impl FighterSpec {
    pub fn new(position: DVec2) -> Self {
        Self {
            position,
            velocity: DVec2::ZERO,
            radius: DEFAULT_RADIUS,
            weapon: None,
            loadout: None,
            stamina: Stamina::default(),
            morale: Morale::default().value,
            blood_ml: DEFAULT_BLOOD_ML,
        }
    }

    pub fn with_weapon(mut self, weapon: Arc<Weapon>) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_loadout(mut self, loadout: Loadout) -> Self {
        self.loadout = Some(loadout);
        self
    }

    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_morale(mut self, morale: i32) -> Self {
        self.morale = morale;
        self
    }

    pub fn with_stamina(mut self, stamina: Stamina) -> Self {
        self.stamina = stamina;
        self
    }
}

/// Attach every component a fighter needs. Returns the new id.
pub fn spawn_fighter(world: &mut World, spec: &FighterSpec) -> EntityId {
    let id = world.spawn();
    world.positions.add(id, Position(spec.position));
    world.velocities.add(id, Velocity(spec.velocity));
    world.radii.add(id, CollisionRadius(spec.radius));
    world.anatomies.add(id, Anatomy::human());
    world.vitals.add(id, Vitals::new(spec.blood_ml));
    world.wounds.add(id, Wounds::default());
    world.stamina.add(id, spec.stamina.clone());
    world.morale.add(id, Morale::new(spec.morale));
    if let Some(weapon) = &spec.weapon {
        world.weapons.add(id, Arc::clone(weapon));
    }
    if let Some(loadout) = &spec.loadout {
        world.loadouts.add(id, loadout.clone());
    }
    id
}

/// Two maul fighters facing each other on the x axis, `separation` apart.
pub fn spawn_duel(world: &mut World, separation: f64, radius: f64) -> SimResult<(EntityId, EntityId)> {
    let maul = Arc::new(Weapon::maul(&world.catalogue)?);
    let fighter = |x: f64| {
        FighterSpec::new(DVec2::new(x, 0.0))
            .with_radius(radius)
            .with_weapon(Arc::clone(&maul))
            .with_loadout(Loadout::default())
    };
    let a = spawn_fighter(world, &fighter(-separation / 2.0));
    let b = spawn_fighter(world, &fighter(separation / 2.0));
    world.opponents.add(a, Opponent(b));
    world.opponents.add(b, Opponent(a));
    Ok((a, b))
}

/// `count` fighters evenly spaced on a ring, circling the centre at
/// `orbit_speed` m/s. Each targets its clockwise neighbour. Weapons alternate
/// maul and spear.
pub fn spawn_crowd(
    world: &mut World,
    count: usize,
    ring_radius: f64,
    orbit_speed: f64,
) -> SimResult<Vec<EntityId>> {
    let maul = Arc::new(Weapon::maul(&world.catalogue)?);
    let spear = Arc::new(Weapon::spear(&world.catalogue)?);

    let ids: Vec<EntityId> = (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            let position = DVec2::from_angle(angle) * ring_radius;
            let weapon = if i % 2 == 0 { &maul } else { &spear };
            let spec = FighterSpec::new(position)
                .with_velocity(orbit_velocity(position, DVec2::ZERO, orbit_speed))
                .with_weapon(Arc::clone(weapon))
                .with_loadout(Loadout::default());
            spawn_fighter(world, &spec)
        })
        .collect();

    if ids.len() > 1 {
        for (i, id) in ids.iter().enumerate() {
            let target = ids[(i + 1) % ids.len()];
            world.opponents.add(*id, Opponent(target));
        }
    }
    Ok(ids)
}
