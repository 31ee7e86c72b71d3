//! Circle-circle collision with a uniform-grid broad phase.
//!
//! Cell edge is `2 * max radius`, so overlapping circles always share a cell
//! or sit in adjacent cells. Each cell is checked against itself and four
//! forward neighbours, which visits every adjacent pair exactly once.
//! Overlaps are split evenly between both bodies, then bodies are clamped
//! inside the arena rim.

use std::collections::BTreeMap;

use bevy::math::DVec2;

use crate::constants::{
    ARENA_RADIUS, CELL_RESIZE_TOLERANCE, COINCIDENT_NUDGE, DEFAULT_COLLISION_PASSES, MIN_CELL_SIZE,
};
use crate::ecs::{EntityId, World};
use crate::engine::System;
use crate::error::SimResult;

type CellKey = (i64, i64);

const FORWARD_NEIGHBOURS: [CellKey; 4] = [(1, 0), (1, 1), (0, 1), (-1, 1)];

#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f64,
    cells: BTreeMap<CellKey, Vec<EntityId>>,
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(MIN_CELL_SIZE),
            cells: BTreeMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Adopt a new cell size. Returns true when it changed enough to matter.
    pub fn resize(&mut self, cell_size: f64) -> bool {
        let cell_size = cell_size.max(MIN_CELL_SIZE);
        if (cell_size - self.cell_size).abs() > CELL_RESIZE_TOLERANCE {
            self.cell_size = cell_size;
            self.cells.clear();
            true
        } else {
            false
        }
    }

    pub fn cell_of(&self, point: DVec2) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
        )
    }

    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (EntityId, DVec2)>) {
        self.cells.clear();
        for (id, point) in entries {
            let key = self.cell_of(point);
            self.cells.entry(key).or_default().push(id);
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Every pair sharing a cell or adjacent cells, each listed once.
    pub fn candidate_pairs(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs = Vec::new();
        for (&(cx, cy), ids) in &self.cells {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    pairs.push((a, b));
                }
            }
            for (dx, dy) in FORWARD_NEIGHBOURS {
                let Some(others) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &a in ids {
                    for &b in others {
                        pairs.push((a, b));
                    }
                }
            }
        }
        pairs
    }
}

/// Push two overlapping circles apart along their centre line, half each.
/// Coincident centres are split along x. Either way one call leaves them
/// exactly `combined_radius` apart.
pub fn separate(a: &mut DVec2, b: &mut DVec2, combined_radius: f64) -> bool {
    let mut delta = *a - *b;
    let mut dist2 = delta.length_squared();
    if dist2 >= combined_radius * combined_radius {
        return false;
    }
    if dist2 == 0.0 {
        a.x += COINCIDENT_NUDGE;
        b.x -= COINCIDENT_NUDGE;
        delta = DVec2::new(2.0 * COINCIDENT_NUDGE, 0.0);
        dist2 = delta.length_squared();
    }
    let dist = dist2.sqrt();
    let push = 0.5 * (combined_radius - dist) / dist;
    *a += delta * push;
    *b -= delta * push;
    true
}

/// Project `point` back inside a rim of `arena_radius` for a body of `radius`.
pub fn clamp_to_rim(point: DVec2, radius: f64, arena_radius: f64) -> DVec2 {
    let limit = (arena_radius - radius).max(0.0);
    let dist2 = point.length_squared();
    if dist2 <= limit * limit {
        return point;
    }
    let dist = dist2.sqrt();
    if dist == 0.0 {
        DVec2::new(limit, 0.0)
    } else {
        point * (limit / dist)
    }
}

pub struct CollisionSystem {
    arena_radius: f64,
    passes: u32,
    grid: SpatialHash,
}

impl CollisionSystem {
    pub fn new(arena_radius: f64, passes: u32) -> Self {
        Self {
            arena_radius,
            passes: passes.max(1),
            grid: SpatialHash::new(MIN_CELL_SIZE),
        }
    }

    pub fn grid(&self) -> &SpatialHash {
        &self.grid
    }

    fn resolve_pass(&mut self, world: &mut World) -> usize {
        let bodies: Vec<(EntityId, DVec2)> = world
            .radii
            .iter()
            .filter(|(_, r)| r.0.is_finite() && r.0 > 0.0)
            .filter_map(|(id, _)| world.positions.get(id).map(|p| (id, p.0)))
            .collect();
        if bodies.is_empty() {
            return 0;
        }

        let max_radius = bodies
            .iter()
            .filter_map(|(id, _)| world.radii.get(*id).map(|r| r.0))
            .fold(0.0, f64::max);
        self.grid.resize(2.0 * max_radius);
        self.grid.rebuild(bodies.iter().copied());

        let mut resolved = 0;
        for (a, b) in self.grid.candidate_pairs() {
            let (Some(ra), Some(rb)) = (world.radii.get(a), world.radii.get(b)) else {
                continue;
            };
            let combined = ra.0 + rb.0;
            let (Some(pa), Some(pb)) = (world.positions.get(a), world.positions.get(b)) else {
                continue;
            };
            let (mut pa, mut pb) = (pa.0, pb.0);
            if separate(&mut pa, &mut pb, combined) {
                resolved += 1;
                if let Some(p) = world.positions.get_mut(a) {
                    p.0 = pa;
                }
                if let Some(p) = world.positions.get_mut(b) {
                    p.0 = pb;
                }
            }
        }

        for (id, _) in &bodies {
            let Some(radius) = world.radii.get(*id).map(|r| r.0) else {
                continue;
            };
            if let Some(p) = world.positions.get_mut(*id) {
                p.0 = clamp_to_rim(p.0, radius, self.arena_radius);
            }
        }
        resolved
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(ARENA_RADIUS, DEFAULT_COLLISION_PASSES)
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn run(&mut self, world: &mut World, _dt: f64) -> SimResult<()> {
        for _ in 0..self.passes {
            if self.resolve_pass(world) == 0 {
                break;
            }
        }
        Ok(())
    }
}
