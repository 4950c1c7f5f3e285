//! Population model: logistic growth, technology drift, and the migration
//! pressure hook.
//!
//! Growth per tick is
//!
//! ```text
//! pop' = round_half_even(pop + pop * growth_rate * (1 - pop / carrying_capacity))
//! ```
//!
//! Rounding ties to even keeps repeated runs bit-identical regardless of how
//! the fractional part happens to land.

use std::collections::BTreeMap;
use std::fmt::Debug;

use frontier_types::{SystemId, SystemState};

use crate::config::PopulationConfig;
use crate::rng::StreamRng;
use crate::tick::TickContext;
use crate::world::WorldError;

/// Net migration into a system for one tick.
///
/// Invoked once per system every tick, after growth, so that inter-system
/// transfer can be added later without changing the phase order or the
/// draw sequence of any stream.
pub trait MigrationPressure: Debug + Send + Sync {
    /// Signed change in population (positive = arrivals).
    fn net_migration(&self, system_id: &SystemId, cohesion: f64, tech_level: f64) -> i64;
}

/// The reference model: nobody moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMigration;

impl MigrationPressure for NoMigration {
    fn net_migration(&self, _system_id: &SystemId, _cohesion: f64, _tech_level: f64) -> i64 {
        0
    }
}

/// One logistic growth step, rounded half-to-even.
///
/// # Errors
///
/// Returns [`WorldError::Invariant`] if the result is not a representable
/// non-negative integer (NaN, infinite, or beyond `u64::MAX`). Results
/// below zero clamp to zero.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn logistic_step(
    system_id: &SystemId,
    population: u64,
    growth_rate: f64,
    carrying_capacity: f64,
) -> Result<u64, WorldError> {
    let pop = population as f64;
    let grown = (pop * growth_rate).mul_add(1.0 - pop / carrying_capacity, pop);
    let rounded = grown.round_ties_even();
    if !rounded.is_finite() || rounded >= u64::MAX as f64 {
        return Err(WorldError::Invariant {
            system_id: system_id.clone(),
            reason: format!("population growth produced {grown}"),
        });
    }
    Ok(rounded.max(0.0) as u64)
}

/// Apply one tick of population growth and technology drift to every system.
///
/// Records each system's pre-tick technology level in `ctx` for the
/// politics model and the event generator.
///
/// # Errors
///
/// Returns [`WorldError::Invariant`] if growth leaves the representable
/// range for any system.
pub fn apply(
    systems: &mut BTreeMap<SystemId, SystemState>,
    config: &PopulationConfig,
    migration: &dyn MigrationPressure,
    rng: &mut StreamRng,
    ctx: &mut TickContext,
) -> Result<(), WorldError> {
    for (system_id, system) in systems.iter_mut() {
        ctx.tech_before.insert(system_id.clone(), system.tech_level);

        let (growth_rate, carrying_capacity) = config.growth_for(system_id.as_str());
        system.population =
            logistic_step(system_id, system.population, growth_rate, carrying_capacity)?;

        let drift = config.tech_growth_per_tick + rng.jitter(config.tech_noise);
        system.tech_level = (system.tech_level + drift).max(0.0);

        let net = migration.net_migration(system_id, system.internal_cohesion, system.tech_level);
        system.population = system.population.saturating_add_signed(net);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sol() -> SystemId {
        SystemId::from("Sol")
    }

    #[test]
    fn logistic_step_compounds_two_percent() {
        let next = logistic_step(&sol(), 10_000_000, 0.02, 1_000_000_000.0).unwrap();
        // 10M * 0.02 * (1 - 0.01) = 198_000
        assert_eq!(next, 10_198_000);
    }

    #[test]
    fn logistic_step_rounds_ties_to_even() {
        // 25 * 0.02 = 0.5 exactly; infinite capacity keeps the brake at 1.
        assert_eq!(logistic_step(&sol(), 25, 0.02, f64::INFINITY).unwrap(), 26);
        // 75 * 0.02 = 1.5 -> 76.5 rounds to 76.
        assert_eq!(logistic_step(&sol(), 75, 0.02, f64::INFINITY).unwrap(), 76);
    }

    #[test]
    fn logistic_step_stops_at_capacity() {
        assert_eq!(logistic_step(&sol(), 1_000, 0.02, 1_000.0).unwrap(), 1_000);
        assert!(logistic_step(&sol(), 2_000, 0.02, 1_000.0).unwrap() < 2_000);
    }

    #[test]
    fn logistic_step_clamps_at_zero() {
        assert_eq!(logistic_step(&sol(), 100, -5.0, 1_000.0).unwrap(), 0);
    }

    #[test]
    fn logistic_step_rejects_non_finite_growth() {
        assert!(logistic_step(&sol(), 100, f64::INFINITY, 1_000.0).is_err());
    }

    #[test]
    fn reference_run_reaches_about_26_million_after_50_ticks() {
        let mut pop = 10_000_000;
        for _ in 0..50 {
            pop = logistic_step(&sol(), pop, 0.02, 1_000_000_000.0).unwrap();
        }
        assert!((26_400_000..26_600_000).contains(&pop), "population {pop}");
    }

    #[test]
    fn apply_drifts_tech_and_records_pre_tick_level() {
        let mut systems = BTreeMap::new();
        systems.insert(sol(), SystemState::colony(10_000_000, 5.0, 0.7));
        let config = PopulationConfig::default();
        let mut rng = StreamRng::derive(1, "population");
        let mut ctx = TickContext::new(1);

        apply(&mut systems, &config, &NoMigration, &mut rng, &mut ctx).unwrap();

        let system = &systems[&sol()];
        assert_eq!(system.population, 10_198_000);
        assert!((system.tech_level - 5.025).abs() <= 0.01 + 1e-12);
        assert_eq!(ctx.tech_before.get(&sol()), Some(&5.0));
    }

    #[test]
    fn migration_hook_is_applied_after_growth() {
        #[derive(Debug)]
        struct Exodus;
        impl MigrationPressure for Exodus {
            fn net_migration(&self, _id: &SystemId, _cohesion: f64, _tech: f64) -> i64 {
                -198_000
            }
        }

        let mut systems = BTreeMap::new();
        systems.insert(sol(), SystemState::colony(10_000_000, 5.0, 0.7));
        let mut rng = StreamRng::derive(1, "population");
        let mut ctx = TickContext::new(1);

        apply(&mut systems, &PopulationConfig::default(), &Exodus, &mut rng, &mut ctx).unwrap();
        assert_eq!(systems[&sol()].population, 10_000_000);
    }
}
