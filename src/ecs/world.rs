//! The `World` aggregate: every component store, the event bus, the tick
//! counter and the simulation's only random number generator.

use std::sync::Arc;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{ComponentStore, EntityAllocator, EntityId};
use crate::actions::ActionCatalogue;
use crate::combat::{AttackState, Loadout, Opponent, Weapon};
use crate::events::EventBus;
use crate::fatigue::{Morale, Stamina};
use crate::health::{Anatomy, Vitals, Wounds};
use crate::movement::{CollisionRadius, Position, Velocity};

pub struct World {
    /// Logical tick counter, incremented by the scheduler before systems run
    pub tick: u64,
    pub entities: EntityAllocator,
    /// Sole source of randomness for every system
    pub rng: Xoshiro256PlusPlus,
    pub catalogue: Arc<ActionCatalogue>,
    pub events: EventBus,

    pub positions: ComponentStore<Position>,
    pub velocities: ComponentStore<Velocity>,
    pub radii: ComponentStore<CollisionRadius>,

    pub weapons: ComponentStore<Arc<Weapon>>,
    pub attack_states: ComponentStore<AttackState>,
    pub opponents: ComponentStore<Opponent>,
    pub loadouts: ComponentStore<Loadout>,

    pub anatomies: ComponentStore<Anatomy>,
    pub vitals: ComponentStore<Vitals>,
    pub wounds: ComponentStore<Wounds>,

    pub stamina: ComponentStore<Stamina>,
    pub morale: ComponentStore<Morale>,

    seed: u64,
}

impl World {
    pub fn new(seed: u64, catalogue: Arc<ActionCatalogue>) -> Self {
        Self {
            tick: 0,
            entities: EntityAllocator::new(),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            catalogue,
            events: EventBus::new(),
            positions: ComponentStore::new(),
            velocities: ComponentStore::new(),
            radii: ComponentStore::new(),
            weapons: ComponentStore::new(),
            attack_states: ComponentStore::new(),
            opponents: ComponentStore::new(),
            loadouts: ComponentStore::new(),
            anatomies: ComponentStore::new(),
            vitals: ComponentStore::new(),
            wounds: ComponentStore::new(),
            stamina: ComponentStore::new(),
            morale: ComponentStore::new(),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn spawn(&mut self) -> EntityId {
        self.entities.next_id()
    }

    /// Remove every component of `id`.
    pub fn despawn(&mut self, id: EntityId) {
        self.positions.remove(id);
        self.velocities.remove(id);
        self.radii.remove(id);
        self.weapons.remove(id);
        self.attack_states.remove(id);
        self.opponents.remove(id);
        self.loadouts.remove(id);
        self.anatomies.remove(id);
        self.vitals.remove(id);
        self.wounds.remove(id);
        self.stamina.remove(id);
        self.morale.remove(id);
    }

    /// Entities without vitals count as alive.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.vitals.get(id).map_or(true, |v| v.alive)
    }

    pub fn has_surrendered(&self, id: EntityId) -> bool {
        self.morale.get(id).is_some_and(|m| m.surrendered)
    }

    /// Alive and still fighting
    pub fn is_combatant(&self, id: EntityId) -> bool {
        self.is_alive(id) && !self.has_surrendered(id)
    }

    pub fn flush_events(&mut self) {
        self.events.flush();
    }
}
