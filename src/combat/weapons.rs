//! Weapon definitions.
//!
//! A weapon is immutable data: attack profiles taken from the action
//! catalogue, an ordered list of hit capsules, mass and edge type.

use serde::{Deserialize, Serialize};

use crate::actions::{ActionCatalogue, ActionId, ActionPhase, SubPhases};
use crate::constants::SPEED_BINS;
use crate::error::{SimError, SimResult};

/// How the striking surface meets tissue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Blunt,
    Slash,
    Pierce,
}

impl EdgeType {
    /// Share of kinetic energy delivered as shear
    pub fn shear_coefficient(&self) -> f64 {
        match self {
            EdgeType::Blunt => 0.0,
            EdgeType::Slash => 0.6,
            EdgeType::Pierce => 1.0,
        }
    }

    /// Penetration fraction per speed bin: <2, <5, <8, >=8 m/s
    fn penetration_table(&self) -> [f64; 4] {
        match self {
            EdgeType::Blunt => [0.0, 0.1, 0.25, 0.4],
            EdgeType::Slash => [0.05, 0.25, 0.6, 0.9],
            EdgeType::Pierce => [0.1, 0.4, 0.8, 1.0],
        }
    }

    /// Fraction of the layer stack a strike at `speed` travels through
    pub fn penetration_fraction(&self, speed: f64) -> f64 {
        let bin = SPEED_BINS.iter().take_while(|edge| speed >= **edge).count();
        self.penetration_table()[bin]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Blunt => "blunt",
            EdgeType::Slash => "slash",
            EdgeType::Pierce => "pierce",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    /// 90 degree arc across the heading
    Swing,
    /// Straight extension along the heading
    Thrust,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    pub action_id: ActionId,
    pub kind: SwingKind,
    pub windup_ticks: u32,
    pub active_ticks: u32,
    pub recovery_ticks: u32,
}

impl AttackProfile {
    /// Build from a catalogue attack row. The row must declare wind/hit/reco.
    pub fn from_catalogue(catalogue: &ActionCatalogue, action_id: &str) -> SimResult<Self> {
        let spec = catalogue.get(action_id)?;
        if spec.phase != ActionPhase::Attack {
            return Err(SimError::InvalidWeapon(format!(
                "'{}' is not an attack action",
                action_id
            )));
        }
        match spec.sub_phases {
            Some(SubPhases::Attack {
                windup,
                active,
                recovery,
            }) => Ok(Self {
                action_id: spec.id.clone(),
                kind: spec.kind.unwrap_or(SwingKind::Swing),
                windup_ticks: windup,
                active_ticks: active,
                recovery_ticks: recovery,
            }),
            _ => Err(SimError::MissingField {
                action: action_id.to_string(),
                field: "wind",
            }),
        }
    }

    pub fn total_ticks(&self) -> u32 {
        self.windup_ticks + self.active_ticks + self.recovery_ticks
    }
}

/// A hit capsule: a small circle carried along the swing direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitSegment {
    /// Distance from the attacker's centre, meters
    pub offset: f64,
    pub radius: f64,
    pub tag: String,
}

impl HitSegment {
    pub fn new(offset: f64, radius: f64, tag: impl Into<String>) -> Self {
        Self {
            offset,
            radius,
            tag: tag.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    profiles: Vec<AttackProfile>,
    segments: Vec<HitSegment>,
    pub mass_kg: f64,
    pub edge: EdgeType,
    /// Encumbrance class looked up in the catalogue's weapon table
    pub encumbrance_class: String,
}

impl Weapon {
    pub fn new(
        name: impl Into<String>,
        profiles: Vec<AttackProfile>,
        segments: Vec<HitSegment>,
        mass_kg: f64,
        edge: EdgeType,
        encumbrance_class: impl Into<String>,
    ) -> SimResult<Self> {
        let name = name.into();
        if profiles.is_empty() {
            return Err(SimError::InvalidWeapon(format!("{} has no attack profiles", name)));
        }
        if segments.is_empty() {
            return Err(SimError::InvalidWeapon(format!("{} has no hit segments", name)));
        }
        if let Some(p) = profiles
            .iter()
            .find(|p| p.windup_ticks == 0 || p.active_ticks == 0 || p.recovery_ticks == 0)
        {
            return Err(SimError::InvalidWeapon(format!(
                "{}: profile '{}' has a zero-length phase",
                name, p.action_id
            )));
        }
        if segments.iter().any(|s| s.offset < 0.0 || s.radius <= 0.0) {
            return Err(SimError::InvalidWeapon(format!(
                "{}: segments need offset >= 0 and radius > 0",
                name
            )));
        }
        if mass_kg.is_nan() || mass_kg <= 0.0 {
            return Err(SimError::InvalidWeapon(format!("{}: mass must be positive", name)));
        }
        Ok(Self {
            name,
            profiles,
            segments,
            mass_kg,
            edge,
            encumbrance_class: encumbrance_class.into(),
        })
    }

    /// Build a weapon whose profiles come from catalogue attack rows.
    pub fn from_catalogue(
        catalogue: &ActionCatalogue,
        name: &str,
        action_ids: &[&str],
        segments: Vec<HitSegment>,
        mass_kg: f64,
        edge: EdgeType,
        encumbrance_class: &str,
    ) -> SimResult<Self> {
        let profiles = action_ids
            .iter()
            .map(|id| AttackProfile::from_catalogue(catalogue, id))
            .collect::<SimResult<Vec<_>>>()?;
        Self::new(name, profiles, segments, mass_kg, edge, encumbrance_class)
    }

    /// Two-handed blunt maul, 5 kg, four swings
    pub fn maul(catalogue: &ActionCatalogue) -> SimResult<Self> {
        Self::from_catalogue(
            catalogue,
            "maul",
            &["light_slash", "heavy_overhead", "arcing_sweep", "wild_twohand"],
            vec![
                HitSegment::new(0.20, 0.25, "strong_edge"),
                HitSegment::new(0.95, 0.20, "weak_edge"),
                HitSegment::new(1.20, 0.05, "point"),
            ],
            5.0,
            EdgeType::Blunt,
            "heavy",
        )
    }

    /// Spear, 2.5 kg, piercing thrusts
    pub fn spear(catalogue: &ActionCatalogue) -> SimResult<Self> {
        Self::from_catalogue(
            catalogue,
            "spear",
            &["quick_thrust", "lunge"],
            vec![
                HitSegment::new(1.60, 0.06, "point"),
                HitSegment::new(1.20, 0.04, "shaft"),
            ],
            2.5,
            EdgeType::Pierce,
            "medium",
        )
    }

    pub fn profiles(&self) -> &[AttackProfile] {
        &self.profiles
    }

    /// Profile used by swing number `swing_id`
    pub fn profile_for_swing(&self, swing_id: u64) -> (usize, &AttackProfile) {
        let idx = (swing_id % self.profiles.len() as u64) as usize;
        (idx, &self.profiles[idx])
    }

    pub fn segments(&self) -> &[HitSegment] {
        &self.segments
    }

    /// Largest capsule offset, meters
    pub fn reach(&self) -> f64 {
        self.segments.iter().map(|s| s.offset).fold(0.0, f64::max)
    }
}
