//! Action/Timing Catalogue
//!
//! Versioned balance table for every move, attack and defend action. Each
//! action has a tick duration, either explicit or derived from its sub-phases
//! (attack = wind + hit + reco, defend = react + active + reset). Locomotion
//! rows must carry `ticks`.
//!
//! `effective_ticks` applies encumbrance, stats and exhaustion to a base
//! duration. `version_hash` fingerprints the whole table so regression
//! baselines notice when balance data changed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::combat::SwingKind;
use crate::constants::{
    COORDINATION_BONUS_PER_POINT, COORDINATION_CAP, EXHAUSTION_TIME_PENALTY, FLANK_DISTANCE_M,
    PERCEPTION_BONUS_PER_POINT, PERCEPTION_CAP,
};
use crate::digest::sha3_hex;
use crate::error::{SimError, SimResult};

/// Shared action identifier
pub type ActionId = Arc<str>;

/// Built-in action table, embedded at compile time
pub const BUILTIN_ACTIONS: &str = include_str!("../../assets/actions.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionPhase {
    Move,
    Attack,
    Defend,
}

/// Sub-phase durations, when the row declares them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubPhases {
    Attack { windup: u32, active: u32, recovery: u32 },
    Defend { react: u32, active: u32, reset: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub id: ActionId,
    pub phase: ActionPhase,
    pub ticks: u32,
    pub dist_m: f64,
    pub stamina_cost: f64,
    pub sub_phases: Option<SubPhases>,
    /// Swing or thrust, attacks only
    pub kind: Option<SwingKind>,
}

/// Stamina as seen by the timing calculator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaminaReading {
    pub current: f64,
    pub exhaustion_threshold: f64,
}

impl StaminaReading {
    pub fn fresh() -> Self {
        Self {
            current: f64::MAX,
            exhaustion_threshold: 0.0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.current <= self.exhaustion_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ChainPredicate {
    Always,
    /// Attacker and target centres no further apart than this many meters
    WithinFlank(f64),
}

impl ChainPredicate {
    fn parse(name: Option<&str>) -> SimResult<Self> {
        match name {
            None => Ok(ChainPredicate::Always),
            Some("within_flank_1m") => Ok(ChainPredicate::WithinFlank(FLANK_DISTANCE_M)),
            Some(other) => Err(SimError::UnknownPredicate(other.to_string())),
        }
    }

    pub fn holds(&self, target_distance: f64) -> bool {
        match self {
            ChainPredicate::Always => true,
            ChainPredicate::WithinFlank(limit) => target_distance <= *limit,
        }
    }
}

/// Windup modifier applied when `next` directly follows `trigger`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRule {
    pub trigger: String,
    pub next: BTreeSet<String>,
    pub windup_delta: i32,
    pub predicate: ChainPredicate,
}

// =====================================================
// Raw JSON rows
// =====================================================

#[derive(Debug, Deserialize)]
struct RawCatalogue {
    encumbrance_mult: RawEncumbrance,
    #[serde(default)]
    locomotion: Vec<RawAction>,
    #[serde(default)]
    attacks: Vec<RawAction>,
    #[serde(default)]
    defence: Vec<RawAction>,
    #[serde(default)]
    chains: Vec<RawChain>,
}

#[derive(Debug, Deserialize)]
struct RawEncumbrance {
    armor: BTreeMap<String, f64>,
    weapon: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    id: String,
    ticks: Option<u32>,
    dist_m: Option<f64>,
    stam: f64,
    wind: Option<u32>,
    hit: Option<u32>,
    reco: Option<u32>,
    react: Option<u32>,
    active: Option<u32>,
    reset: Option<u32>,
    kind: Option<SwingKind>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawChain {
    trigger: OneOrMany,
    next: Vec<String>,
    delta: i32,
    predicate: Option<String>,
}

fn required(value: Option<u32>, action: &str, field: &'static str) -> SimResult<u32> {
    value.ok_or_else(|| SimError::MissingField {
        action: action.to_string(),
        field,
    })
}

impl RawAction {
    fn into_spec(self, phase: ActionPhase) -> SimResult<ActionSpec> {
        let sub_phases = match phase {
            ActionPhase::Attack => match (self.wind, self.hit, self.reco) {
                (Some(windup), Some(active), Some(recovery)) => Some(SubPhases::Attack {
                    windup,
                    active,
                    recovery,
                }),
                _ => None,
            },
            ActionPhase::Defend => match (self.react, self.active, self.reset) {
                (Some(react), Some(active), Some(reset)) => Some(SubPhases::Defend {
                    react,
                    active,
                    reset,
                }),
                _ => None,
            },
            ActionPhase::Move => None,
        };

        let ticks = match self.ticks {
            Some(ticks) => ticks,
            None => match phase {
                ActionPhase::Attack => {
                    required(self.wind, &self.id, "wind")?
                        + required(self.hit, &self.id, "hit")?
                        + required(self.reco, &self.id, "reco")?
                }
                ActionPhase::Defend => {
                    required(self.react, &self.id, "react")?
                        + required(self.active, &self.id, "active")?
                        + required(self.reset, &self.id, "reset")?
                }
                ActionPhase::Move => {
                    return Err(SimError::MissingField {
                        action: self.id,
                        field: "ticks",
                    })
                }
            },
        };

        let kind = match phase {
            ActionPhase::Attack => Some(self.kind.unwrap_or(SwingKind::Swing)),
            _ => None,
        };

        Ok(ActionSpec {
            id: Arc::from(self.id.as_str()),
            phase,
            ticks,
            dist_m: self.dist_m.unwrap_or(0.0),
            stamina_cost: self.stam,
            sub_phases,
            kind,
        })
    }
}

/// Rebuild every object with its keys in ascending order.
fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// =====================================================
// Catalogue
// =====================================================

#[derive(Debug, Clone)]
pub struct ActionCatalogue {
    actions: BTreeMap<String, ActionSpec>,
    armor: BTreeMap<String, f64>,
    weapon: BTreeMap<String, f64>,
    chains: Vec<ChainRule>,
    hash: String,
}

impl ActionCatalogue {
    /// The table shipped in `assets/actions.json`
    pub fn builtin() -> SimResult<Self> {
        Self::from_json(BUILTIN_ACTIONS)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let value = sort_keys(serde_json::from_str(json)?);
        let canonical = serde_json::to_vec(&value)?;
        let hash = sha3_hex(&canonical);

        let raw: RawCatalogue = serde_json::from_value(value)?;
        let mut actions = BTreeMap::new();
        for (rows, phase) in [
            (raw.locomotion, ActionPhase::Move),
            (raw.attacks, ActionPhase::Attack),
            (raw.defence, ActionPhase::Defend),
        ] {
            for row in rows {
                let spec = row.into_spec(phase)?;
                actions.insert(spec.id.to_string(), spec);
            }
        }

        let chains = raw
            .chains
            .into_iter()
            .enumerate()
            .map(|(i, rule)| {
                let trigger = match rule.trigger {
                    OneOrMany::One(id) => id,
                    OneOrMany::Many(ids) => {
                        ids.into_iter().next().ok_or_else(|| SimError::MissingField {
                            action: format!("chains[{i}]"),
                            field: "trigger",
                        })?
                    }
                };
                Ok(ChainRule {
                    trigger,
                    next: rule.next.into_iter().collect(),
                    windup_delta: rule.delta,
                    predicate: ChainPredicate::parse(rule.predicate.as_deref())?,
                })
            })
            .collect::<SimResult<Vec<_>>>()?;

        tracing::debug!(
            actions = actions.len(),
            chains = chains.len(),
            hash = %hash,
            "Action catalogue loaded"
        );

        Ok(Self {
            actions,
            armor: raw.encumbrance_mult.armor,
            weapon: raw.encumbrance_mult.weapon,
            chains,
            hash,
        })
    }

    pub fn get(&self, action_id: &str) -> SimResult<&ActionSpec> {
        self.actions
            .get(action_id)
            .ok_or_else(|| SimError::UnknownAction(action_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.values()
    }

    pub fn chains(&self) -> &[ChainRule] {
        &self.chains
    }

    pub fn armor_multiplier(&self, class: &str) -> SimResult<f64> {
        self.armor
            .get(class)
            .copied()
            .ok_or_else(|| SimError::UnknownEncumbrance {
                table: "armor",
                class: class.to_string(),
            })
    }

    pub fn weapon_multiplier(&self, class: &str) -> SimResult<f64> {
        self.weapon
            .get(class)
            .copied()
            .ok_or_else(|| SimError::UnknownEncumbrance {
                table: "weapon",
                class: class.to_string(),
            })
    }

    /// Final tick duration of `action_id` for an actor with the given loadout and state.
    ///
    /// Multipliers apply in order: armor, weapon, coordination (capped at 20),
    /// perception (defend actions only, capped at 20), exhaustion penalty.
    /// The result is rounded half-to-even and floored at 1.
    pub fn effective_ticks(
        &self,
        action_id: &str,
        armor_class: &str,
        weapon_class: &str,
        stamina: StaminaReading,
        coordination: u32,
        perception: u32,
    ) -> SimResult<u32> {
        let spec = self.get(action_id)?;
        let mut t = spec.ticks as f64;
        t *= self.armor_multiplier(armor_class)?;
        t *= self.weapon_multiplier(weapon_class)?;
        t *= 1.0 - COORDINATION_BONUS_PER_POINT * coordination.min(COORDINATION_CAP) as f64;
        if spec.phase == ActionPhase::Defend {
            t *= 1.0 - PERCEPTION_BONUS_PER_POINT * perception.min(PERCEPTION_CAP) as f64;
        }
        if stamina.is_exhausted() {
            t *= EXHAUSTION_TIME_PENALTY;
        }
        Ok((t.round_ties_even() as u32).max(1))
    }

    /// Windup delta for `next` following `previous`, first matching rule wins.
    pub fn chain_windup_delta(&self, previous: &str, next: &str, target_distance: f64) -> i32 {
        self.chains
            .iter()
            .find(|rule| {
                rule.trigger == previous
                    && rule.next.contains(next)
                    && rule.predicate.holds(target_distance)
            })
            .map_or(0, |rule| rule.windup_delta)
    }

    /// SHA3-256 hex digest of the key-sorted table
    pub fn version_hash(&self) -> &str {
        &self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> ActionCatalogue {
        ActionCatalogue::builtin().unwrap()
    }

    fn table(locomotion: &str) -> String {
        format!(
            r#"{{
                "encumbrance_mult": {{
                    "armor": {{"none": 1.0}},
                    "weapon": {{"medium": 1.0, "feather": 0.1}}
                }},
                "locomotion": [{locomotion}],
                "attacks": [{{"id": "jab", "wind": 1, "hit": 1, "reco": 1, "stam": 1}}],
                "defence": [],
                "chains": []
            }}"#
        )
    }

    #[test]
    fn test_attack_ticks_derived_from_sub_phases() {
        let cat = catalogue();
        let slash = cat.get("light_slash").unwrap();
        assert_eq!(slash.ticks, 13);
        assert_eq!(slash.phase, ActionPhase::Attack);
        assert_eq!(
            slash.sub_phases,
            Some(SubPhases::Attack {
                windup: 5,
                active: 3,
                recovery: 5
            })
        );
        assert_eq!(slash.kind, Some(SwingKind::Swing));
    }

    #[test]
    fn test_defend_ticks_derived() {
        let cat = catalogue();
        let parry = cat.get("parry").unwrap();
        assert_eq!(parry.ticks, 12);
        assert_eq!(parry.phase, ActionPhase::Defend);
    }

    #[test]
    fn test_move_keeps_explicit_ticks() {
        let cat = catalogue();
        let walk = cat.get("walk_step").unwrap();
        assert_eq!(walk.ticks, 20);
        assert!((walk.dist_m - 0.7).abs() < 1e-12);
        assert_eq!(walk.kind, None);
    }

    #[test]
    fn test_move_without_ticks_is_error() {
        let json = table(r#"{"id": "shuffle", "dist_m": 0.2, "stam": 1}"#);
        let err = ActionCatalogue::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            SimError::MissingField { ref action, field: "ticks" } if action == "shuffle"
        ));
    }

    #[test]
    fn test_attack_missing_sub_phase_is_error() {
        let json = r#"{
            "encumbrance_mult": {"armor": {}, "weapon": {}},
            "attacks": [{"id": "broken", "wind": 2, "reco": 2, "stam": 1}]
        }"#;
        let err = ActionCatalogue::from_json(json).unwrap_err();
        assert!(matches!(err, SimError::MissingField { field: "hit", .. }));
    }

    #[test]
    fn test_unknown_action_is_error() {
        let err = catalogue().get("moonwalk").unwrap_err();
        assert!(matches!(err, SimError::UnknownAction(ref id) if id == "moonwalk"));
    }

    #[test]
    fn test_unknown_class_is_error() {
        let cat = catalogue();
        let err = cat
            .effective_ticks("light_slash", "mithril", "medium", StaminaReading::fresh(), 0, 0)
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownEncumbrance { table: "armor", .. }));
        let err = cat
            .effective_ticks("light_slash", "none", "trebuchet", StaminaReading::fresh(), 0, 0)
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownEncumbrance { table: "weapon", .. }));
    }

    #[test]
    fn test_effective_ticks_baseline() {
        let cat = catalogue();
        let t = cat
            .effective_ticks("light_slash", "none", "medium", StaminaReading::fresh(), 0, 0)
            .unwrap();
        assert_eq!(t, 13);
    }

    #[test]
    fn test_effective_ticks_encumbrance_and_coordination() {
        let cat = catalogue();
        // 13 * 1.15 * 1.2 * 0.9 = 16.146
        let t = cat
            .effective_ticks("light_slash", "medium", "heavy", StaminaReading::fresh(), 10, 0)
            .unwrap();
        assert_eq!(t, 16);
    }

    #[test]
    fn test_coordination_capped() {
        let cat = catalogue();
        let at_cap = cat
            .effective_ticks("light_slash", "none", "medium", StaminaReading::fresh(), 20, 0)
            .unwrap();
        let beyond = cat
            .effective_ticks("light_slash", "none", "medium", StaminaReading::fresh(), 50, 0)
            .unwrap();
        assert_eq!(at_cap, 10);
        assert_eq!(beyond, at_cap);
    }

    #[test]
    fn test_perception_only_for_defend() {
        let cat = catalogue();
        // 12 * 0.93 = 11.16
        let parry = cat
            .effective_ticks("parry", "none", "medium", StaminaReading::fresh(), 0, 10)
            .unwrap();
        assert_eq!(parry, 11);
        let slash = cat
            .effective_ticks("light_slash", "none", "medium", StaminaReading::fresh(), 0, 20)
            .unwrap();
        assert_eq!(slash, 13);
    }

    #[test]
    fn test_exhaustion_penalty() {
        let cat = catalogue();
        let drained = StaminaReading {
            current: 0.0,
            exhaustion_threshold: 0.0,
        };
        assert!(drained.is_exhausted());
        // 13 * 1.15 = 14.95
        let t = cat
            .effective_ticks("light_slash", "none", "medium", drained, 0, 0)
            .unwrap();
        assert_eq!(t, 15);
    }

    #[test]
    fn test_effective_ticks_floor_at_one() {
        let json = table(r#"{"id": "blink", "ticks": 1, "stam": 0}"#);
        let cat = ActionCatalogue::from_json(&json).unwrap();
        let t = cat
            .effective_ticks("blink", "none", "feather", StaminaReading::fresh(), 20, 0)
            .unwrap();
        assert_eq!(t, 1);
    }

    #[test]
    fn test_chain_rules() {
        let cat = catalogue();
        assert_eq!(cat.chain_windup_delta("light_slash", "heavy_overhead", 5.0), -2);
        assert_eq!(cat.chain_windup_delta("arcing_sweep", "wild_twohand", 0.8), -1);
        assert_eq!(cat.chain_windup_delta("arcing_sweep", "wild_twohand", 1.5), 0);
        assert_eq!(cat.chain_windup_delta("heavy_overhead", "light_slash", 0.5), 0);
    }

    #[test]
    fn test_unknown_predicate_is_error() {
        let json = r#"{
            "encumbrance_mult": {"armor": {}, "weapon": {}},
            "attacks": [{"id": "a", "wind": 1, "hit": 1, "reco": 1, "stam": 1}],
            "chains": [{"trigger": "a", "next": ["a"], "delta": -1, "predicate": "full_moon"}]
        }"#;
        let err = ActionCatalogue::from_json(json).unwrap_err();
        assert!(matches!(err, SimError::UnknownPredicate(ref p) if p == "full_moon"));
    }

    #[test]
    fn test_empty_chain_trigger_is_error() {
        let json = r#"{
            "encumbrance_mult": {"armor": {}, "weapon": {}},
            "attacks": [{"id": "a", "wind": 1, "hit": 1, "reco": 1, "stam": 1}],
            "chains": [
                {"trigger": ["a"], "next": ["a"], "delta": -1},
                {"trigger": [], "next": ["a"], "delta": -1}
            ]
        }"#;
        match ActionCatalogue::from_json(json) {
            Err(SimError::MissingField { action, field }) => {
                assert_eq!(action, "chains[1]");
                assert_eq!(field, "trigger");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_version_hash_stable_and_order_independent() {
        let a = r#"{"encumbrance_mult": {"armor": {"none": 1.0}, "weapon": {"medium": 1.0}}, "locomotion": [{"id": "w", "ticks": 2, "stam": 1}]}"#;
        let b = r#"{"locomotion": [{"stam": 1, "ticks": 2, "id": "w"}], "encumbrance_mult": {"weapon": {"medium": 1.0}, "armor": {"none": 1.0}}}"#;
        let ha = ActionCatalogue::from_json(a).unwrap();
        let hb = ActionCatalogue::from_json(b).unwrap();
        assert_eq!(ha.version_hash(), hb.version_hash());
        assert_eq!(ha.version_hash().len(), 64);
    }

    #[test]
    fn test_version_hash_detects_balance_change() {
        let base = catalogue();
        let tweaked = BUILTIN_ACTIONS.replace(r#""stam": 4, "kind": "swing""#, r#""stam": 5, "kind": "swing""#);
        assert_ne!(tweaked, BUILTIN_ACTIONS);
        let changed = ActionCatalogue::from_json(&tweaked).unwrap();
        assert_ne!(base.version_hash(), changed.version_hash());
        assert_eq!(base.version_hash(), catalogue().version_hash());
    }
}
