//! Economy model: output, consumption, and trade balance.
//!
//! ```text
//! economic_output' = population * tech_level * productivity
//! trade_balance'   = economic_output' - population * consumption_per_capita
//! ```
//!
//! Runs after the population model, so it sees this tick's population and
//! technology. Systems whose balance falls below the low-water mark are
//! flagged in the tick context as shortage candidates.

use std::collections::BTreeMap;

use frontier_types::{SystemId, SystemState};

use crate::config::EconomyConfig;
use crate::rng::StreamRng;
use crate::tick::TickContext;

/// Apply one tick of the economy model to every system.
#[allow(clippy::cast_precision_loss)]
pub fn apply(
    systems: &mut BTreeMap<SystemId, SystemState>,
    config: &EconomyConfig,
    rng: &mut StreamRng,
    ctx: &mut TickContext,
) {
    for (system_id, system) in systems.iter_mut() {
        let population = system.population as f64;
        let fluctuation = 1.0 + rng.jitter(config.productivity_noise);

        let output = (population * system.tech_level * config.productivity * fluctuation).max(0.0);
        let consumption = population * config.consumption_per_capita;
        let balance = output - consumption;

        system.economic_output = output;
        system.trade_balance = balance;

        let relative = if consumption > 0.0 {
            balance / consumption
        } else {
            0.0
        };
        ctx.relative_balance.insert(system_id.clone(), relative);

        if balance < config.shortage_low_water {
            ctx.shortage_candidates
                .insert(system_id.clone(), consumption - output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(population: u64, tech_level: f64, config: &EconomyConfig) -> (SystemState, TickContext) {
        let id = SystemId::from("Sol");
        let mut systems = BTreeMap::new();
        systems.insert(id.clone(), SystemState::colony(population, tech_level, 0.7));
        let mut rng = StreamRng::derive(1, "economy");
        let mut ctx = TickContext::new(1);
        apply(&mut systems, config, &mut rng, &mut ctx);
        (systems.remove(&id).unwrap_or_else(|| SystemState::colony(0, 0.0, 0.0)), ctx)
    }

    #[test]
    fn output_scales_with_population_and_tech() {
        let (system, ctx) = run(10_000_000, 5.0, &EconomyConfig::default());
        // 10M * 5 * 0.001 = 50_000; consumption 10M * 0.004 = 40_000
        assert!((system.economic_output - 50_000.0).abs() < 1e-6);
        assert!((system.trade_balance - 10_000.0).abs() < 1e-6);
        assert!(ctx.shortage_candidates.is_empty());
        let relative = ctx.relative_balance.values().next().copied().unwrap_or_default();
        assert!((relative - 0.25).abs() < 1e-12);
    }

    #[test]
    fn low_tech_system_becomes_shortage_candidate() {
        let (system, ctx) = run(10_000_000, 2.0, &EconomyConfig::default());
        assert!(system.trade_balance < 0.0);
        let deficit = ctx
            .shortage_candidates
            .get(&SystemId::from("Sol"))
            .copied()
            .unwrap_or_default();
        assert!((deficit - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn low_water_mark_is_configurable() {
        let config = EconomyConfig {
            shortage_low_water: 20_000.0,
            ..EconomyConfig::default()
        };
        let (_, ctx) = run(10_000_000, 5.0, &config);
        assert_eq!(ctx.shortage_candidates.len(), 1);
    }

    #[test]
    fn productivity_noise_stays_within_amplitude() {
        let config = EconomyConfig {
            productivity_noise: 0.1,
            ..EconomyConfig::default()
        };
        let (system, _) = run(10_000_000, 5.0, &config);
        assert!((45_000.0..=55_000.0).contains(&system.economic_output));
    }
}
