//! Politics model: cohesion drift and independence movements.
//!
//! ```text
//! cohesion' = clamp01(cohesion
//!                     + trade_weight * tanh(trade_balance / consumption)
//!                     + tech_weight  * (tech_level - tech_level_before_tick)
//!                     + noise)
//! ```
//!
//! The update reads only the system's own state for this tick; there is no
//! coupling between systems in this model version.
//!
//! Independence movements use hysteresis: one starts when cohesion drops
//! below `independence_trigger` in a system above the population minimum,
//! and persists until cohesion climbs back above the higher
//! `independence_recovery` threshold.

use std::collections::BTreeMap;

use frontier_types::{SystemId, SystemState};
use tracing::debug;

use crate::config::PoliticsConfig;
use crate::rng::StreamRng;
use crate::tick::TickContext;

/// Cohesion change for one tick, before noise and clamping.
pub fn cohesion_delta(config: &PoliticsConfig, relative_balance: f64, tech_delta: f64) -> f64 {
    config
        .trade_weight
        .mul_add(relative_balance.tanh(), config.tech_weight * tech_delta)
}

/// Whether an independence movement is active after this tick.
pub fn independence_after(
    config: &PoliticsConfig,
    active: bool,
    cohesion: f64,
    population: u64,
) -> bool {
    if active {
        cohesion <= config.independence_recovery
    } else {
        cohesion < config.independence_trigger && population > config.independence_min_population
    }
}

/// Apply one tick of the politics model to every system.
pub fn apply(
    systems: &mut BTreeMap<SystemId, SystemState>,
    config: &PoliticsConfig,
    rng: &mut StreamRng,
    ctx: &mut TickContext,
) {
    for (system_id, system) in systems.iter_mut() {
        let relative = ctx.relative_balance.get(system_id).copied().unwrap_or(0.0);
        let tech_before = ctx
            .tech_before
            .get(system_id)
            .copied()
            .unwrap_or(system.tech_level);
        let delta = cohesion_delta(config, relative, system.tech_level - tech_before)
            + rng.jitter(config.cohesion_noise);
        system.internal_cohesion = (system.internal_cohesion + delta).clamp(0.0, 1.0);

        let was_active = system.has_independence_movement;
        system.has_independence_movement = independence_after(
            config,
            was_active,
            system.internal_cohesion,
            system.population,
        );
        if system.has_independence_movement && !was_active {
            debug!(
                tick = ctx.tick,
                system = %system_id,
                cohesion = system.internal_cohesion,
                "Independence movement started"
            );
            ctx.movements_started.insert(system_id.clone());
        } else if was_active && !system.has_independence_movement {
            debug!(
                tick = ctx.tick,
                system = %system_id,
                cohesion = system.internal_cohesion,
                "Independence movement dissolved"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PoliticsConfig {
        PoliticsConfig {
            cohesion_noise: 0.0,
            ..PoliticsConfig::default()
        }
    }

    #[test]
    fn surplus_and_rising_tech_raise_cohesion() {
        let c = config();
        assert!(cohesion_delta(&c, 0.25, 0.025) > 0.0);
        assert!(cohesion_delta(&c, -0.5, -0.1) < 0.0);
        assert!(cohesion_delta(&c, 0.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trade_term_saturates() {
        let c = config();
        let huge = cohesion_delta(&c, 1.0e9, 0.0);
        assert!(huge <= c.trade_weight + f64::EPSILON);
    }

    #[test]
    fn hysteresis_prevents_flapping() {
        let c = config();
        let pop = 10_000_000;
        // Dropping below the trigger starts a movement.
        assert!(independence_after(&c, false, 0.25, pop));
        // Between the thresholds, state is sticky in both directions.
        assert!(independence_after(&c, true, 0.4, pop));
        assert!(!independence_after(&c, false, 0.4, pop));
        // Only climbing above recovery ends it.
        assert!(!independence_after(&c, true, 0.55, pop));
    }

    #[test]
    fn small_colonies_do_not_start_movements() {
        let c = config();
        assert!(!independence_after(&c, false, 0.1, 500_000));
    }

    #[test]
    fn apply_clamps_and_records_started_movements() {
        let id = SystemId::from("Kepler-442");
        let mut systems = BTreeMap::new();
        let mut colony = SystemState::colony(5_000_000, 5.0, 0.3);
        colony.trade_balance = -1.0;
        systems.insert(id.clone(), colony);

        let mut ctx = TickContext::new(1);
        ctx.relative_balance.insert(id.clone(), -3.0);
        ctx.tech_before.insert(id.clone(), 5.5);

        let mut rng = StreamRng::derive(1, "politics");
        apply(&mut systems, &config(), &mut rng, &mut ctx);

        let system = &systems[&id];
        assert!(system.internal_cohesion >= 0.0);
        assert!(system.internal_cohesion < 0.3);
        assert!(system.has_independence_movement);
        assert!(ctx.movements_started.contains(&id));
    }

    #[test]
    fn cohesion_never_exceeds_one() {
        let id = SystemId::from("Sol");
        let mut systems = BTreeMap::new();
        systems.insert(id.clone(), SystemState::colony(10_000_000, 5.0, 0.999));
        let mut ctx = TickContext::new(1);
        ctx.relative_balance.insert(id.clone(), 10.0);
        ctx.tech_before.insert(id.clone(), 4.0);
        let mut rng = StreamRng::derive(1, "politics");
        apply(&mut systems, &config(), &mut rng, &mut ctx);
        assert!((systems[&id].internal_cohesion - 1.0).abs() < f64::EPSILON);
    }
}
