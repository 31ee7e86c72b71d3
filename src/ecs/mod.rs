//! Entity/component store.
//!
//! Entities are bare ids handed out by a monotonic allocator. Components
//! live in one `ComponentStore<T>` per type, keyed by id and iterated in id
//! order so every system visits entities deterministically.

pub mod world;

pub use world::World;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque entity identifier. Never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Monotonic id generator, starting at 0.
#[derive(Debug, Clone, Default)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

/// Typed map from entity to component value.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    data: BTreeMap<EntityId, T>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a component, returning the one it replaced.
    pub fn add(&mut self, id: EntityId, value: T) -> Option<T> {
        self.data.insert(id, value)
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.data.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.data.get_mut(&id)
    }

    /// Detach a component. Removing an absent component is a no-op.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.data.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.data.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Ids in ascending order
    pub fn ids(&self) -> Vec<EntityId> {
        self.data.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.data.iter().map(|(id, value)| (*id, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.data.iter_mut().map(|(id, value)| (*id, value))
    }

    /// Fetch or insert a component built by `make`.
    pub fn get_or_insert_with(&mut self, id: EntityId, make: impl FnOnce() -> T) -> &mut T {
        self.data.entry(id).or_insert_with(make)
    }
}
