//! Mutable world state of one run.
//!
//! The tick counter is the single source of temporal truth: simulated years
//! are derived from it and never stored. Systems enter the map when they are
//! settled and are never removed; every per-system loop walks the map in
//! [`SystemId`] order.

use std::collections::BTreeMap;

use frontier_types::{SettledSystem, SystemId, SystemState};

/// Errors raised by world-state checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// A system's state broke a model invariant.
    #[error("invariant violated in {system_id}: {reason}")]
    Invariant {
        /// The offending system.
        system_id: SystemId,
        /// What was wrong.
        reason: String,
    },
}

/// Population, economy, and politics of every settled system, plus time.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    tick: u64,
    /// Settled systems keyed by catalog id.
    pub systems: BTreeMap<SystemId, SystemState>,
}

impl WorldState {
    /// A world at tick 0 with a single settled system.
    pub fn founded(starting_system: SystemId, colony: SystemState) -> Self {
        let mut systems = BTreeMap::new();
        systems.insert(starting_system, colony);
        Self { tick: 0, systems }
    }

    /// Number of completed ticks.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the tick counter. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, WorldError> {
        self.tick = self.tick.checked_add(1).ok_or(WorldError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Simulated time elapsed since founding.
    #[allow(clippy::cast_precision_loss)]
    pub fn simulated_year(&self, year_per_tick: f64) -> f64 {
        self.tick as f64 * year_per_tick
    }

    /// Settle a system. Returns `false` (and changes nothing) if it is
    /// already settled.
    pub fn settle(&mut self, system_id: SystemId, colony: SystemState) -> bool {
        if self.systems.contains_key(&system_id) {
            return false;
        }
        self.systems.insert(system_id, colony);
        true
    }

    /// Sum of every system's population, saturating at `u64::MAX`.
    pub fn total_population(&self) -> u64 {
        self.systems
            .values()
            .fold(0_u64, |total, system| total.saturating_add(system.population))
    }

    /// Per-system projections in identifier order.
    pub fn settled_systems(&self) -> Vec<SettledSystem> {
        self.systems
            .iter()
            .map(|(id, state)| SettledSystem::project(id, state))
            .collect()
    }

    /// Verify every system's state is one the models can have produced.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Invariant`] for the first offending system.
    pub fn check_invariants(&self) -> Result<(), WorldError> {
        for (system_id, system) in &self.systems {
            let violation = |reason: String| WorldError::Invariant {
                system_id: system_id.clone(),
                reason,
            };
            if !system.tech_level.is_finite() || system.tech_level < 0.0 {
                return Err(violation(format!("tech_level = {}", system.tech_level)));
            }
            if !(0.0..=1.0).contains(&system.internal_cohesion) {
                return Err(violation(format!(
                    "internal_cohesion = {}",
                    system.internal_cohesion
                )));
            }
            if !system.economic_output.is_finite() || system.economic_output < 0.0 {
                return Err(violation(format!(
                    "economic_output = {}",
                    system.economic_output
                )));
            }
            if !system.trade_balance.is_finite() {
                return Err(violation(format!("trade_balance = {}", system.trade_balance)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sol() -> WorldState {
        WorldState::founded(SystemId::from("Sol"), SystemState::colony(10_000_000, 5.0, 0.7))
    }

    #[test]
    fn founded_world_starts_at_tick_zero() {
        let world = sol();
        assert_eq!(world.tick(), 0);
        assert_eq!(world.systems.len(), 1);
        assert_eq!(world.total_population(), 10_000_000);
    }

    #[test]
    fn simulated_year_is_derived_from_tick() {
        let mut world = sol();
        for _ in 0..10 {
            assert!(world.advance().is_ok());
        }
        assert!((world.simulated_year(0.25) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn settling_twice_is_refused() {
        let mut world = sol();
        assert!(world.settle(SystemId::from("Alpha Centauri"), SystemState::colony(500, 5.0, 0.7)));
        assert!(!world.settle(SystemId::from("Sol"), SystemState::colony(1, 0.0, 0.0)));
        assert_eq!(world.total_population(), 10_000_500);
        let order: Vec<String> = world
            .settled_systems()
            .into_iter()
            .map(|s| s.system_id.to_string())
            .collect();
        assert_eq!(order, vec!["Alpha Centauri", "Sol"]);
    }

    #[test]
    fn invariant_check_catches_bad_cohesion() {
        let mut world = sol();
        assert!(world.check_invariants().is_ok());
        if let Some(system) = world.systems.get_mut(&SystemId::from("Sol")) {
            system.internal_cohesion = 1.5;
        }
        assert!(matches!(
            world.check_invariants(),
            Err(WorldError::Invariant { ref reason, .. }) if reason.contains("internal_cohesion")
        ));
    }

    #[test]
    fn invariant_check_catches_non_finite_tech() {
        let mut world = sol();
        if let Some(system) = world.systems.get_mut(&SystemId::from("Sol")) {
            system.tech_level = f64::NAN;
        }
        assert!(world.check_invariants().is_err());
    }
}
