//! Arena Combat Core
//!
//! Deterministic fixed-tick melee combat simulation:
//! - Entity/component store and `World` aggregate (ecs)
//! - Fixed-step scheduler, configuration, bout runner and bevy host (engine)
//! - Movement integration and spatial-hash collision (movement)
//! - Data-driven action timing catalogue (actions)
//! - Attack state machine with swept capsule hit detection (combat)
//! - Layered tissue damage and bleeding (health)
//! - Stamina, exhaustion and morale (fatigue)
//! - Parallel seeded balance batches (balance)
//!
//! Identical seed, system order and initial components reproduce identical
//! event journals.

pub mod actions;
pub mod arena;
pub mod balance;
pub mod combat;
pub mod constants;
mod digest;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod events;
pub mod fatigue;
pub mod health;
pub mod logging;
pub mod movement;

pub use ecs::{EntityId, World};
pub use engine::{BoutOutcome, BoutResolution, SimConfig, Simulation};
pub use error::{SimError, SimResult};
