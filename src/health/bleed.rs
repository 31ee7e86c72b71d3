//! Circulatory drain.
//!
//! Each tick every living fighter loses `sum(bleed rates) * dt` ml. An empty
//! pool kills the fighter with cause exsanguination, exactly once.

use tracing::debug;

use crate::ecs::World;
use crate::engine::System;
use crate::error::SimResult;
use crate::events::{DeathCause, DeathEvent};

#[derive(Debug, Default)]
pub struct BleedSystem;

impl System for BleedSystem {
    fn name(&self) -> &'static str {
        "bleed"
    }

    fn run(&mut self, world: &mut World, dt: f64) -> SimResult<()> {
        let tick = world.tick;
        let mut deaths = Vec::new();

        for (id, vitals) in world.vitals.iter_mut() {
            if !vitals.alive {
                continue;
            }
            let rate = world.wounds.get(id).map_or(0.0, |w| w.total_rate());
            vitals.loss_rate_ml_s = rate;
            if rate > 0.0 {
                vitals.blood_ml = (vitals.blood_ml - rate * dt).max(0.0);
            }
            if vitals.blood_ml <= 0.0 {
                vitals.alive = false;
                debug!(tick, entity = %id, "exsanguination");
                deaths.push(DeathEvent {
                    tick,
                    entity: id,
                    cause: DeathCause::Exsanguination,
                });
            }
        }

        for death in deaths {
            world.events.post(death);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionCatalogue;
    use crate::events::EventKind;
    use crate::health::{Region, Vitals, Wounds};
    use std::sync::Arc;

    fn world() -> World {
        World::new(11, Arc::new(ActionCatalogue::builtin().unwrap()))
    }

    #[test]
    fn test_drains_summed_rates() {
        let mut w = world();
        let id = w.spawn();
        w.vitals.add(id, Vitals::default());
        let mut wounds = Wounds::default();
        wounds.open(Region::LeftArm, 5.0, false);
        wounds.open(Region::Thorax, 20.0, true);
        w.wounds.add(id, wounds);

        BleedSystem.run(&mut w, 0.02).unwrap();
        let v = w.vitals.get(id).unwrap();
        assert!((v.blood_ml - 4999.5).abs() < 1e-9);
        assert!((v.loss_rate_ml_s - 25.0).abs() < 1e-12);
        assert!(v.alive);
    }

    #[test]
    fn test_no_wounds_no_loss() {
        let mut w = world();
        let id = w.spawn();
        w.vitals.add(id, Vitals::default());
        BleedSystem.run(&mut w, 0.02).unwrap();
        assert_eq!(w.vitals.get(id).unwrap().blood_ml, 5000.0);
    }

    #[test]
    fn test_exsanguination_boundary_fires_once() {
        let mut w = world();
        let id = w.spawn();
        let rate = 150.0;
        let dt = 0.02;
        w.vitals.add(id, Vitals::new(rate * dt));
        let mut wounds = Wounds::default();
        wounds.open(Region::Neck, rate, true);
        w.wounds.add(id, wounds);

        BleedSystem.run(&mut w, dt).unwrap();
        let v = w.vitals.get(id).unwrap();
        assert_eq!(v.blood_ml, 0.0);
        assert!(!v.alive);
        let deaths: Vec<_> = w
            .events
            .pending()
            .iter()
            .filter(|e| e.kind() == EventKind::Death)
            .cloned()
            .collect();
        assert_eq!(deaths.len(), 1);

        w.events.flush();
        BleedSystem.run(&mut w, dt).unwrap();
        assert_eq!(w.events.pending_len(), 0);
        assert_eq!(w.vitals.get(id).unwrap().blood_ml, 0.0);
    }
}
