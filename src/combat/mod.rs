//! Attack state machine and weapon data.
//!
//! IDLE -> WINDUP -> ACTIVE -> RECOVERY -> IDLE, each phase counted down in
//! ticks. `AttackSystem` drives the machine and runs capsule hit detection
//! while ACTIVE.

use serde::{Deserialize, Serialize};

use crate::actions::ActionId;
use crate::ecs::EntityId;

pub mod attack;
pub mod hitbox;
pub mod weapons;

pub use attack::AttackSystem;
pub use weapons::{AttackProfile, EdgeType, HitSegment, SwingKind, Weapon};

/// Attack phase for tick-based combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackPhase {
    #[default]
    Idle,
    Windup,
    Active,
    Recovery,
}

impl AttackPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackPhase::Idle => "idle",
            AttackPhase::Windup => "windup",
            AttackPhase::Active => "active",
            AttackPhase::Recovery => "recovery",
        }
    }
}

/// Phase lengths for the swing in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub windup: u32,
    pub active: u32,
    pub recovery: u32,
}

impl PhaseTimings {
    pub fn from_profile(profile: &AttackProfile) -> Self {
        Self {
            windup: profile.windup_ticks,
            active: profile.active_ticks,
            recovery: profile.recovery_ticks,
        }
    }

    /// Scale every phase, rounding half-to-even with a floor of one tick.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ticks: u32| ((ticks as f64 * factor).round_ties_even() as u32).max(1);
        Self {
            windup: scale(self.windup),
            active: scale(self.active),
            recovery: scale(self.recovery),
        }
    }

    /// Shift windup by `delta` ticks, never below one.
    pub fn with_windup_delta(mut self, delta: i32) -> Self {
        self.windup = (self.windup as i64 + delta as i64).max(1) as u32;
        self
    }

    pub fn total(&self) -> u32 {
        self.windup + self.active + self.recovery
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttackState {
    pub phase: AttackPhase,
    pub ticks_left: u32,
    pub target: Option<EntityId>,
    pub profile_idx: usize,
    /// Completed swings; also the id of the swing in progress
    pub swing_id: u64,
    pub has_hit: bool,
    pub timings: PhaseTimings,
    /// Action of the most recently started swing, for chain rules
    pub last_action: Option<ActionId>,
}

impl AttackState {
    pub fn is_idle(&self) -> bool {
        self.phase == AttackPhase::Idle
    }

    /// Enter WINDUP against `target`.
    pub fn begin_swing(
        &mut self,
        target: EntityId,
        profile_idx: usize,
        timings: PhaseTimings,
        action_id: ActionId,
    ) {
        self.phase = AttackPhase::Windup;
        self.ticks_left = timings.windup;
        self.target = Some(target);
        self.profile_idx = profile_idx;
        self.has_hit = false;
        self.timings = timings;
        self.last_action = Some(action_id);
    }

    /// Count down one tick. Returns the phase entered, if a transition fired.
    pub fn advance(&mut self) -> Option<AttackPhase> {
        if self.is_idle() {
            return None;
        }
        self.ticks_left = self.ticks_left.saturating_sub(1);
        if self.ticks_left > 0 {
            return None;
        }
        let next = match self.phase {
            AttackPhase::Windup => {
                self.ticks_left = self.timings.active;
                self.has_hit = false;
                AttackPhase::Active
            }
            AttackPhase::Active => {
                self.ticks_left = self.timings.recovery;
                AttackPhase::Recovery
            }
            AttackPhase::Recovery => {
                self.swing_id += 1;
                AttackPhase::Idle
            }
            AttackPhase::Idle => AttackPhase::Idle,
        };
        self.phase = next;
        Some(next)
    }
}

/// The entity this fighter auto-attacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opponent(pub EntityId);

/// Equipment and stats consumed by the timing calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub armor_class: String,
    pub coordination: u32,
    pub perception: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            armor_class: "none".into(),
            coordination: 0,
            perception: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn timings() -> PhaseTimings {
        PhaseTimings {
            windup: 3,
            active: 2,
            recovery: 2,
        }
    }

    #[test]
    fn test_full_cycle_transitions_on_zero() {
        let mut state = AttackState::default();
        assert_eq!(state.advance(), None);

        state.begin_swing(EntityId(1), 0, timings(), Arc::from("light_slash"));
        assert_eq!(state.phase, AttackPhase::Windup);

        let mut log = Vec::new();
        for _ in 0..7 {
            log.push((state.advance(), state.ticks_left));
        }
        assert_eq!(
            log,
            vec![
                (None, 2),
                (None, 1),
                (Some(AttackPhase::Active), 2),
                (None, 1),
                (Some(AttackPhase::Recovery), 2),
                (None, 1),
                (Some(AttackPhase::Idle), 0),
            ]
        );
        assert_eq!(state.swing_id, 1);
        assert_eq!(state.advance(), None);
    }

    #[test]
    fn test_entering_active_clears_hit_flag() {
        let mut state = AttackState::default();
        state.begin_swing(EntityId(1), 0, timings(), Arc::from("light_slash"));
        state.has_hit = true;
        state.advance();
        state.advance();
        assert_eq!(state.advance(), Some(AttackPhase::Active));
        assert!(!state.has_hit);
    }

    #[test]
    fn test_scaled_timings() {
        let t = PhaseTimings {
            windup: 5,
            active: 3,
            recovery: 5,
        };
        // 14 / 13 stretch: 5.38 -> 5, 3.23 -> 3
        assert_eq!(t.scaled(14.0 / 13.0), t);
        let fast = t.scaled(0.1);
        assert_eq!((fast.windup, fast.active, fast.recovery), (1, 1, 1));
        // 2.5 rounds to even
        let half = PhaseTimings {
            windup: 5,
            active: 5,
            recovery: 7,
        }
        .scaled(0.5);
        assert_eq!((half.windup, half.active, half.recovery), (2, 2, 4));
    }

    #[test]
    fn test_windup_delta_floor() {
        assert_eq!(timings().with_windup_delta(-2).windup, 1);
        assert_eq!(timings().with_windup_delta(-9).windup, 1);
        assert_eq!(timings().with_windup_delta(4).windup, 7);
        assert_eq!(timings().total(), 7);
    }
}
