//! Tick-scoped combat events
//!
//! Five event kinds, one closed enum:
//! 1. Impact: a hit capsule connected with a defender
//! 2. Activity: an action was performed (stamina accounting)
//! 3. Exhaustion: stamina crossed to zero
//! 4. Death: organ failure or exsanguination
//! 5. Surrender: morale broke
//!
//! Producers `post` into the bus; consumers `peek` or `drain` by kind. At the
//! end of every tick the scheduler flushes the bus: leftovers are dropped and
//! the tick's full event list becomes `last_tick`. The bus can
//! also keep a journal of every posted event, fingerprinted with SHA3-256 for
//! determinism checks.

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

use crate::actions::ActionId;
use crate::combat::EdgeType;
use crate::digest::sha3_hex;
use crate::ecs::EntityId;
use crate::health::Region;

// =====================================================
// Payloads
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    pub tick: u64,
    pub attacker: EntityId,
    pub defender: EntityId,
    pub swing_id: u64,
    pub contact: DVec2,
    /// Linear speed of the connecting capsule, m/s
    pub relative_speed: f64,
    pub weapon_mass: f64,
    pub edge: EdgeType,
    pub contact_tag: String,
    pub region: Region,
}

impl ImpactEvent {
    /// 0.5 * m * v^2, joules
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.weapon_mass * self.relative_speed * self.relative_speed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySampleEvent {
    pub tick: u64,
    pub entity: EntityId,
    pub action_id: ActionId,
    pub distance_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhaustionEvent {
    pub tick: u64,
    pub entity: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    OrganFailure,
    Exsanguination,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::OrganFailure => "organ_failure",
            DeathCause::Exsanguination => "exsanguination",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub tick: u64,
    pub entity: EntityId,
    pub cause: DeathCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurrenderCause {
    Exhaustion,
    LowMorale,
}

impl SurrenderCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurrenderCause::Exhaustion => "exhaustion",
            SurrenderCause::LowMorale => "low_morale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurrenderEvent {
    pub tick: u64,
    pub entity: EntityId,
    pub cause: SurrenderCause,
}

// =====================================================
// Sum type
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Impact,
    Activity,
    Exhaustion,
    Death,
    Surrender,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    Impact(ImpactEvent),
    Activity(ActivitySampleEvent),
    Exhaustion(ExhaustionEvent),
    Death(DeathEvent),
    Surrender(SurrenderEvent),
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SimEvent::Impact(_) => EventKind::Impact,
            SimEvent::Activity(_) => EventKind::Activity,
            SimEvent::Exhaustion(_) => EventKind::Exhaustion,
            SimEvent::Death(_) => EventKind::Death,
            SimEvent::Surrender(_) => EventKind::Surrender,
        }
    }

    pub fn tick(&self) -> u64 {
        match self {
            SimEvent::Impact(e) => e.tick,
            SimEvent::Activity(e) => e.tick,
            SimEvent::Exhaustion(e) => e.tick,
            SimEvent::Death(e) => e.tick,
            SimEvent::Surrender(e) => e.tick,
        }
    }

    /// Deaths and surrenders end a bout
    pub fn is_terminal(&self) -> bool {
        matches!(self, SimEvent::Death(_) | SimEvent::Surrender(_))
    }
}

/// A concrete payload that can be pulled out of the bus by type.
pub trait EventPayload: Sized {
    const KIND: EventKind;

    fn from_event(event: SimEvent) -> Option<Self>;
    fn from_ref(event: &SimEvent) -> Option<&Self>;
}

macro_rules! impl_payload {
    ($payload:ty, $variant:ident) => {
        impl From<$payload> for SimEvent {
            fn from(event: $payload) -> Self {
                SimEvent::$variant(event)
            }
        }

        impl EventPayload for $payload {
            const KIND: EventKind = EventKind::$variant;

            fn from_event(event: SimEvent) -> Option<Self> {
                match event {
                    SimEvent::$variant(e) => Some(e),
                    _ => None,
                }
            }

            fn from_ref(event: &SimEvent) -> Option<&Self> {
                match event {
                    SimEvent::$variant(e) => Some(e),
                    _ => None,
                }
            }
        }
    };
}

impl_payload!(ImpactEvent, Impact);
impl_payload!(ActivitySampleEvent, Activity);
impl_payload!(ExhaustionEvent, Exhaustion);
impl_payload!(DeathEvent, Death);
impl_payload!(SurrenderEvent, Surrender);

// =====================================================
// Bus
// =====================================================

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    pending: Vec<SimEvent>,
    posted: Vec<SimEvent>,
    last_tick: Vec<SimEvent>,
    journal: Vec<SimEvent>,
    recording: bool,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal() -> Self {
        Self {
            recording: true,
            ..Self::default()
        }
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn post(&mut self, event: impl Into<SimEvent>) {
        let event = event.into();
        if self.recording {
            self.journal.push(event.clone());
        }
        self.posted.push(event.clone());
        self.pending.push(event);
    }

    /// Pending events of type `E`, left in place for later consumers.
    pub fn peek<'a, E: EventPayload + 'a>(&'a self) -> impl Iterator<Item = &'a E> + 'a {
        self.pending.iter().filter_map(E::from_ref)
    }

    /// Remove and return pending events of type `E`, in posting order.
    pub fn drain<E: EventPayload>(&mut self) -> Vec<E> {
        let (taken, kept): (Vec<SimEvent>, Vec<SimEvent>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|e| e.kind() == E::KIND);
        self.pending = kept;
        taken.into_iter().filter_map(E::from_event).collect()
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End-of-tick flush: unconsumed events are discarded and everything
    /// posted this tick becomes the "last tick" view.
    pub fn flush(&mut self) {
        self.pending.clear();
        self.last_tick = std::mem::take(&mut self.posted);
    }

    /// Every event posted during the most recently completed tick, consumed or not
    pub fn last_tick(&self) -> &[SimEvent] {
        &self.last_tick
    }

    pub fn journal(&self) -> &[SimEvent] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.journal)
    }

    /// SHA3-256 over the JSON-encoded journal, hex encoded.
    pub fn journal_fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&self.journal).unwrap_or_default();
        sha3_hex(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn activity(tick: u64, entity: u64) -> ActivitySampleEvent {
        ActivitySampleEvent {
            tick,
            entity: EntityId(entity),
            action_id: Arc::from("walk_step"),
            distance_m: 0.1,
        }
    }

    fn death(tick: u64, entity: u64) -> DeathEvent {
        DeathEvent {
            tick,
            entity: EntityId(entity),
            cause: DeathCause::Exsanguination,
        }
    }

    #[test]
    fn test_drain_by_kind_keeps_others() {
        let mut bus = EventBus::new();
        bus.post(activity(1, 0));
        bus.post(death(1, 1));
        bus.post(activity(1, 2));

        let samples = bus.drain::<ActivitySampleEvent>();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].entity, EntityId(0));
        assert_eq!(samples[1].entity, EntityId(2));
        assert_eq!(bus.pending_len(), 1);
        assert!(bus.drain::<ActivitySampleEvent>().is_empty());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut bus = EventBus::new();
        bus.post(death(3, 4));
        assert_eq!(bus.peek::<DeathEvent>().count(), 1);
        assert_eq!(bus.peek::<DeathEvent>().count(), 1);
        assert_eq!(bus.peek::<ImpactEvent>().count(), 0);
    }

    #[test]
    fn test_flush_publishes_everything_posted() {
        let mut bus = EventBus::new();
        bus.post(activity(1, 0));
        bus.post(death(1, 0));
        assert_eq!(bus.drain::<DeathEvent>().len(), 1);
        bus.flush();
        assert_eq!(bus.pending_len(), 0);
        assert_eq!(bus.last_tick().len(), 2);
        assert!(bus.last_tick()[1].is_terminal());
        bus.flush();
        assert!(bus.last_tick().is_empty());
    }

    #[test]
    fn test_journal_only_when_recording() {
        let mut bus = EventBus::new();
        bus.post(activity(1, 0));
        assert!(bus.journal().is_empty());

        let mut bus = EventBus::with_journal();
        bus.post(activity(1, 0));
        bus.drain::<ActivitySampleEvent>();
        bus.flush();
        assert_eq!(bus.journal().len(), 1);
        assert_eq!(bus.journal()[0].kind(), EventKind::Activity);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut a = EventBus::with_journal();
        let mut b = EventBus::with_journal();
        a.post(death(5, 1));
        b.post(death(5, 1));
        assert_eq!(a.journal_fingerprint(), b.journal_fingerprint());
        assert_eq!(a.journal_fingerprint().len(), 64);

        b.post(activity(6, 1));
        assert_ne!(a.journal_fingerprint(), b.journal_fingerprint());
    }

    #[test]
    fn test_cause_names() {
        assert_eq!(DeathCause::OrganFailure.as_str(), "organ_failure");
        assert_eq!(DeathCause::Exsanguination.as_str(), "exsanguination");
        assert_eq!(SurrenderCause::LowMorale.as_str(), "low_morale");
        let json = serde_json::to_string(&SimEvent::from(death(2, 0))).unwrap();
        assert!(json.contains("\"kind\":\"death\""));
        assert!(json.contains("exsanguination"));
    }
}
