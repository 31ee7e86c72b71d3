//! Capsule geometry for active-phase hit detection.
//!
//! During ACTIVE each hit segment is placed at `origin + dir * offset * scale`
//! where `dir` and `scale` depend on swing progress `t` in [0, 1]:
//! - swing: `dir` rotates linearly from +30 to -60 degrees off the heading, `scale` = 1
//! - thrust: `dir` is the heading, `scale` = t

use bevy::math::DVec2;

use super::weapons::{HitSegment, SwingKind};
use crate::constants::{HEADING_EPSILON, SWING_ARC_END_DEG, SWING_ARC_START_DEG};

/// `t = 1 - ticks_left / active_ticks`
pub fn swing_progress(ticks_left: u32, active_ticks: u32) -> f64 {
    if active_ticks == 0 {
        return 1.0;
    }
    (1.0 - ticks_left as f64 / active_ticks as f64).clamp(0.0, 1.0)
}

/// Unit vector from attacker to defender. Coincident centres face +x.
pub fn heading(attacker: DVec2, defender: DVec2) -> DVec2 {
    let delta = defender - attacker;
    let len = delta.length();
    if len < HEADING_EPSILON {
        DVec2::X
    } else {
        delta / len
    }
}

/// Swing arc angle at progress `t`, radians relative to the heading
pub fn arc_angle(t: f64) -> f64 {
    let deg = SWING_ARC_START_DEG + t * (SWING_ARC_END_DEG - SWING_ARC_START_DEG);
    deg.to_radians()
}

/// Direction the capsules extend along, and the offset scale.
pub fn sweep_direction(kind: SwingKind, heading: DVec2, t: f64) -> (DVec2, f64) {
    match kind {
        SwingKind::Swing => (DVec2::from_angle(arc_angle(t)).rotate(heading), 1.0),
        SwingKind::Thrust => (heading, t),
    }
}

/// World-space centre of `segment`
pub fn capsule_centre(origin: DVec2, direction: DVec2, scale: f64, segment: &HitSegment) -> DVec2 {
    origin + direction * segment.offset * scale
}

/// Contact when the centre distance is within the summed radii
pub fn touches(centre: DVec2, radius: f64, target: DVec2, target_radius: f64) -> bool {
    centre.distance(target) <= radius + target_radius
}

/// Linear speed of the weapon tip over the active phase, m/s.
///
/// The arc (quarter circle of `reach` for a swing, `reach` itself for a
/// thrust) is divided by the active phase's length in seconds,
/// `active_ticks * dt`, not by its tick count. The result is therefore
/// independent of the tick rate and is 1/dt times larger than a per-tick
/// displacement. Impact energy uses it squared, so a heavy swing at 50 Hz
/// lands well above the bone break threshold.
pub fn strike_speed(kind: SwingKind, reach: f64, active_ticks: u32, dt: f64) -> f64 {
    let duration = active_ticks.max(1) as f64 * dt;
    if duration <= 0.0 {
        return 0.0;
    }
    match kind {
        SwingKind::Swing => reach * std::f64::consts::FRAC_PI_2 / duration,
        SwingKind::Thrust => reach / duration,
    }
}
