//! Centralized simulation constants for the arena combat core.
//!
//! Tunables that several systems agree on live here. Per-region anatomy
//! tables (hit points, organ bleed rates) stay in `health` next to the
//! types they describe.

// =====================================================
// Time & Arena
// =====================================================

/// Default tick duration in nanoseconds (20 ms, 50 Hz)
pub const DEFAULT_DT_NS: u64 = 20_000_000;

/// Default arena radius in meters
pub const ARENA_RADIUS: f64 = 20.0;

/// Default auto-swing cadence: an idle fighter starts a swing when `tick % N == 0`
pub const DEFAULT_AUTOSWING_TICKS: u64 = 60;

/// Default number of overlap-resolution passes per tick
pub const DEFAULT_COLLISION_PASSES: u32 = 2;

/// Default tick budget for a single bout
pub const DEFAULT_MAX_BOUT_TICKS: u64 = 15_000;

// =====================================================
// Collision
// =====================================================

/// Smallest spatial-hash cell edge in meters
pub const MIN_CELL_SIZE: f64 = 0.01;

/// Cell size change that forces a grid rebuild
pub const CELL_RESIZE_TOLERANCE: f64 = 1e-6;

/// Offset applied along x to separate exactly coincident centres
pub const COINCIDENT_NUDGE: f64 = 1e-6;

// =====================================================
// Attack Geometry
// =====================================================

/// Swing arc start, degrees relative to the attacker->defender heading
pub const SWING_ARC_START_DEG: f64 = 30.0;

/// Swing arc end, degrees relative to the attacker->defender heading
pub const SWING_ARC_END_DEG: f64 = -60.0;

/// Heading length below which attacker and defender count as coincident
pub const HEADING_EPSILON: f64 = 1e-9;

/// Predicate distance for the `within_flank_1m` chain rule
pub const FLANK_DISTANCE_M: f64 = 1.0;

// =====================================================
// Action Timing
// =====================================================

/// Duration reduction per coordination point
pub const COORDINATION_BONUS_PER_POINT: f64 = 0.01;

/// Coordination stat ceiling (20% reduction at maximum)
pub const COORDINATION_CAP: u32 = 20;

/// Defend-duration reduction per perception point
pub const PERCEPTION_BONUS_PER_POINT: f64 = 0.007;

/// Perception stat ceiling
pub const PERCEPTION_CAP: u32 = 20;

/// Duration multiplier while at or below the exhaustion threshold
pub const EXHAUSTION_TIME_PENALTY: f64 = 1.15;

// =====================================================
// Damage
// =====================================================

/// Crush joules per point of bone damage above the break threshold
pub const BONE_HARDNESS: f64 = 15.0;

/// Crush joules per skin hit point when bruising
pub const SKIN_ENERGY_PER_HP: f64 = 10.0;

/// Crush joules per muscle hit point when bruising
pub const MUSCLE_ENERGY_PER_HP: f64 = 7.0;

/// Share of sub-threshold crush energy absorbed by skin
pub const SKIN_BRUISE_SHARE: f64 = 0.33;

/// Share of sub-threshold crush energy absorbed by muscle
pub const MUSCLE_BRUISE_SHARE: f64 = 0.67;

/// External bleed ml/s per unit of penetrated layer proportion
pub const EXTERNAL_BLEED_RATE: f64 = 5.0;

/// Internal bleed ml/s scale for organ damage
pub const INTERNAL_BLEED_RATE: f64 = 30.0;

/// Per-organ chance of a knock-on hit when the region's bone is fractured
pub const FRACTURE_ORGAN_HIT_CHANCE: f64 = 0.25;

/// Relative-speed bin edges (m/s) for the penetration table
pub const SPEED_BINS: [f64; 3] = [2.0, 5.0, 8.0];

/// Penetration depth below this many cm counts as spent
pub const DEPTH_EPSILON: f64 = 1e-9;

/// Circulating blood volume of a fresh fighter (ml)
pub const DEFAULT_BLOOD_ML: f64 = 5000.0;

// =====================================================
// Stamina
// =====================================================

/// Default stamina pool
pub const DEFAULT_STAMINA_MAX: f64 = 100.0;

/// Default idle regeneration per tick
pub const DEFAULT_STAMINA_REGEN: f64 = 0.2;

/// Fraction of max stamina at which exhaustion clears
pub const EXHAUSTION_CLEAR_FRACTION: f64 = 0.25;

/// Regeneration multiplier while morale is DESPERATE
pub const DESPERATE_REGEN_FACTOR: f64 = 0.25;

/// Stamina this close to max snaps to max
pub const STAMINA_SNAP_EPSILON: f64 = 1e-9;

// =====================================================
// Morale
// =====================================================

/// Morale ceiling
pub const MORALE_MAX: i32 = 100;

/// Morale gained by the attacker on a landed hit
pub const MORALE_IMPACT_ATTACKER: f64 = 5.0;

/// Morale lost by the defender on a landed hit
pub const MORALE_IMPACT_DEFENDER: f64 = -10.0;

/// Morale lost on death
pub const MORALE_DEATH: f64 = -100.0;

/// Morale lost on exhaustion
pub const MORALE_EXHAUSTION: f64 = -15.0;

/// Morale erosion per tick per percent of blood volume lost
pub const MORALE_BLOOD_EROSION: f64 = 0.0025;

/// A DESPERATE fighter whose value minus one exhaustion shock falls below this surrenders
pub const SURRENDER_FLOOR: f64 = 10.0;
