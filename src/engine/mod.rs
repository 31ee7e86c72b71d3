//! Simulation engine: scheduling, configuration and host integration.
//!
//! Layers, innermost first:
//!   1. `FixedStepScheduler` runs an ordered list of `System`s over a `World`
//!   2. `Simulation` owns the world plus the standard pipeline and runs bouts
//!   3. `ArenaPlugin` hosts a `Simulation` inside a bevy `App` on `FixedUpdate`
//!
//! Hosts read state through `ArenaSnapshot`; nothing here accepts rendering input.

pub mod config;
pub mod messages;
pub mod plugin;
pub mod scheduler;
pub mod simulation;

pub use config::SimConfig;
pub use messages::{ArenaSnapshot, FighterSnapshot, Vec2Msg};
pub use plugin::{ArenaPlugin, ArenaSimulation};
pub use scheduler::{FixedStepScheduler, System, PROFILE_ENV};
pub use simulation::{standard_systems, BoutOutcome, BoutResolution, Simulation};
