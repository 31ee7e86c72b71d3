//! Anatomy, circulation and wounds.
//!
//! Eight fixed body regions, each a skin/muscle/bone stack of hit-point
//! pools. Head, neck, thorax and abdomen also carry organs. A fighter's blood
//! pool drains through the bleed sources its wounds accumulate.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BLOOD_ML;

pub mod bleed;
pub mod damage;

pub use bleed::BleedSystem;
pub use damage::DamageSystem;

// =====================================================
// Regions & organs
// =====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Head,
    Neck,
    Thorax,
    Abdomen,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::Head,
        Region::Neck,
        Region::Thorax,
        Region::Abdomen,
        Region::LeftArm,
        Region::RightArm,
        Region::LeftLeg,
        Region::RightLeg,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Head => "head",
            Region::Neck => "neck",
            Region::Thorax => "thorax",
            Region::Abdomen => "abdomen",
            Region::LeftArm => "left_arm",
            Region::RightArm => "right_arm",
            Region::LeftLeg => "left_leg",
            Region::RightLeg => "right_leg",
        }
    }

    /// Crush energy (J) at which the bone breaks instead of bruising
    pub fn bone_break_threshold(&self) -> f64 {
        match self {
            Region::Head => 80.0,
            Region::Neck => 60.0,
            Region::Thorax => 120.0,
            Region::Abdomen => 100.0,
            _ => 60.0,
        }
    }

    /// Default (skin, muscle, bone) hit points
    fn layer_hp(&self) -> (u32, u32, u32) {
        match self {
            Region::Head => (15, 25, 20),
            Region::Neck => (10, 10, 0),
            Region::Thorax => (18, 30, 18),
            Region::Abdomen => (18, 28, 15),
            Region::LeftArm | Region::RightArm => (12, 22, 12),
            Region::LeftLeg | Region::RightLeg => (14, 24, 14),
        }
    }

    pub fn organs(&self) -> &'static [OrganKind] {
        match self {
            Region::Head => &[OrganKind::Brain],
            Region::Neck => &[OrganKind::Carotid],
            Region::Thorax => &[OrganKind::Heart, OrganKind::LeftLung, OrganKind::RightLung],
            Region::Abdomen => &[
                OrganKind::Liver,
                OrganKind::Spleen,
                OrganKind::LeftKidney,
                OrganKind::RightKidney,
            ],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganKind {
    Brain,
    Carotid,
    Heart,
    LeftLung,
    RightLung,
    Liver,
    Spleen,
    LeftKidney,
    RightKidney,
}

impl OrganKind {
    pub fn max_hp(&self) -> u32 {
        match self {
            OrganKind::Brain | OrganKind::Heart | OrganKind::Liver => 15,
            OrganKind::Carotid | OrganKind::LeftKidney | OrganKind::RightKidney => 10,
            OrganKind::LeftLung | OrganKind::RightLung | OrganKind::Spleen => 12,
        }
    }

    /// Minimum internal bleed rate once damaged, ml/s
    pub fn catastrophic_bleed_rate(&self) -> f64 {
        match self {
            OrganKind::Brain => 0.0,
            OrganKind::Carotid => 150.0,
            OrganKind::Heart => 120.0,
            OrganKind::LeftLung | OrganKind::RightLung => 20.0,
            OrganKind::Liver => 50.0,
            OrganKind::Spleen => 60.0,
            OrganKind::LeftKidney | OrganKind::RightKidney => 30.0,
        }
    }
}

// =====================================================
// Components
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limb {
    pub region: Region,
    pub skin: u32,
    pub max_skin: u32,
    pub muscle: u32,
    pub max_muscle: u32,
    pub bone: u32,
    pub max_bone: u32,
}

impl Limb {
    pub fn new(region: Region) -> Self {
        let (skin, muscle, bone) = region.layer_hp();
        Self {
            region,
            skin,
            max_skin: skin,
            muscle,
            max_muscle: muscle,
            bone,
            max_bone: bone,
        }
    }

    /// Bone at zero exposes the region's organs
    pub fn is_fractured(&self) -> bool {
        self.bone == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organ {
    pub kind: OrganKind,
    pub hp: u32,
    pub max_hp: u32,
}

impl Organ {
    pub fn new(kind: OrganKind) -> Self {
        Self {
            kind,
            hp: kind.max_hp(),
            max_hp: kind.max_hp(),
        }
    }

    pub fn has_failed(&self) -> bool {
        self.hp == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anatomy {
    limbs: Vec<Limb>,
    organs: Vec<Vec<Organ>>,
}

impl Anatomy {
    pub fn human() -> Self {
        Self {
            limbs: Region::ALL.iter().map(|r| Limb::new(*r)).collect(),
            organs: Region::ALL
                .iter()
                .map(|r| r.organs().iter().map(|k| Organ::new(*k)).collect())
                .collect(),
        }
    }

    pub fn limb(&self, region: Region) -> &Limb {
        &self.limbs[region.index()]
    }

    pub fn limb_mut(&mut self, region: Region) -> &mut Limb {
        &mut self.limbs[region.index()]
    }

    pub fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    pub fn organs(&self, region: Region) -> &[Organ] {
        &self.organs[region.index()]
    }

    pub fn organs_mut(&mut self, region: Region) -> &mut [Organ] {
        &mut self.organs[region.index()]
    }

    /// Split borrow of one region's limb and organs
    pub fn region_mut(&mut self, region: Region) -> (&mut Limb, &mut [Organ]) {
        (
            &mut self.limbs[region.index()],
            &mut self.organs[region.index()],
        )
    }

    pub fn fractured_count(&self) -> usize {
        self.limbs.iter().filter(|l| l.is_fractured()).count()
    }
}

impl Default for Anatomy {
    fn default() -> Self {
        Self::human()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub blood_ml: f64,
    pub max_blood_ml: f64,
    /// Total bleed rate applied on the last tick, ml/s
    pub loss_rate_ml_s: f64,
    pub alive: bool,
}

impl Vitals {
    pub fn new(blood_ml: f64) -> Self {
        Self {
            blood_ml,
            max_blood_ml: blood_ml,
            loss_rate_ml_s: 0.0,
            alive: true,
        }
    }

    /// Percent of circulating volume lost, 0..=100
    pub fn blood_lost_pct(&self) -> f64 {
        if self.max_blood_ml <= 0.0 {
            return 0.0;
        }
        ((self.max_blood_ml - self.blood_ml) / self.max_blood_ml * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(DEFAULT_BLOOD_ML)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BleedSource {
    pub region: Region,
    pub rate_ml_s: f64,
    pub internal: bool,
}

/// Every bleed source a fighter has picked up. Sources stack additively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wounds {
    pub sources: Vec<BleedSource>,
}

impl Wounds {
    pub fn open(&mut self, region: Region, rate_ml_s: f64, internal: bool) {
        self.sources.push(BleedSource {
            region,
            rate_ml_s,
            internal,
        });
    }

    pub fn total_rate(&self) -> f64 {
        self.sources.iter().map(|s| s.rate_ml_s).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_layout() {
        let body = Anatomy::human();
        assert_eq!(body.limbs().len(), 8);
        assert_eq!(body.organs(Region::Thorax).len(), 3);
        assert_eq!(body.organs(Region::Abdomen).len(), 4);
        assert!(body.organs(Region::LeftLeg).is_empty());
        assert_eq!(body.limb(Region::Head).max_muscle, 25);
        assert_eq!(body.fractured_count(), 1); // the neck has no bone pool
    }

    #[test]
    fn test_region_indices_match_order() {
        for (i, region) in Region::ALL.iter().enumerate() {
            assert_eq!(region.index(), i);
        }
        assert_eq!(Region::RightLeg.as_str(), "right_leg");
    }

    #[test]
    fn test_organ_tables() {
        assert_eq!(OrganKind::Heart.max_hp(), 15);
        assert_eq!(OrganKind::Carotid.catastrophic_bleed_rate(), 150.0);
        assert_eq!(OrganKind::Brain.catastrophic_bleed_rate(), 0.0);
        assert!(!Organ::new(OrganKind::Spleen).has_failed());
    }

    #[test]
    fn test_blood_lost_pct() {
        let mut v = Vitals::default();
        assert_eq!(v.blood_lost_pct(), 0.0);
        v.blood_ml = 3750.0;
        assert!((v.blood_lost_pct() - 25.0).abs() < 1e-12);
        v.blood_ml = -5.0;
        assert_eq!(v.blood_lost_pct(), 100.0);
    }

    #[test]
    fn test_wounds_stack() {
        let mut w = Wounds::default();
        w.open(Region::LeftArm, 5.0, false);
        w.open(Region::LeftArm, 5.0, false);
        w.open(Region::Thorax, 120.0, true);
        assert_eq!(w.sources.len(), 3);
        assert!((w.total_rate() - 130.0).abs() < 1e-12);
    }
}
