//! Core state, event, and snapshot structs for the Frontier simulation.
//!
//! [`SystemState`] is the mutable per-system record owned by the engine.
//! Everything else here is an immutable projection handed to callers:
//! [`EventRecord`] entries of the append-only event log, and
//! [`Snapshot`] / [`SnapshotDocument`] point-in-time views of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EventKind, RunState};
use crate::ids::{EventId, SystemId};

// ---------------------------------------------------------------------------
// Per-system state
// ---------------------------------------------------------------------------

/// Mutable state of one settled star system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    /// Number of inhabitants.
    pub population: u64,
    /// Technology level, non-negative and unbounded above.
    pub tech_level: f64,
    /// Political cohesion in `[0, 1]` (0 = fractured, 1 = unified).
    pub internal_cohesion: f64,
    /// Production for the current tick, non-negative.
    pub economic_output: f64,
    /// Production minus consumption for the current tick.
    pub trade_balance: f64,
    /// Whether an independence movement is active.
    pub has_independence_movement: bool,
}

impl SystemState {
    /// A freshly settled colony with no economic history yet.
    pub const fn colony(population: u64, tech_level: f64, internal_cohesion: f64) -> Self {
        Self {
            population,
            tech_level,
            internal_cohesion,
            economic_output: 0.0,
            trade_balance: 0.0,
            has_independence_movement: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Numeric payload of an event, applied to the event's system when logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventImpact {
    /// Technology level increased by `amount`.
    TechGain {
        /// Levels gained.
        amount: f64,
    },
    /// Cohesion decreased by `amount` (clamped at 0).
    CohesionLoss {
        /// Cohesion lost.
        amount: f64,
    },
    /// Settlers arrived.
    PopulationGain {
        /// Fraction of the prior population that arrived.
        fraction: f64,
        /// Number of new inhabitants.
        people: u64,
    },
    /// A shortage of `deficit` production units, costing cohesion.
    Shortage {
        /// Consumption minus production (positive when short).
        deficit: f64,
        /// Cohesion lost.
        cohesion_loss: f64,
    },
}

/// One entry of a run's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventRecord {
    /// Deterministically derived identifier.
    pub event_id: EventId,
    /// The tick during which the event fired.
    pub tick: u64,
    /// The category of event.
    pub event_type: EventKind,
    /// The system the event happened in.
    pub location: SystemId,
    /// Human-readable description.
    pub description: String,
    /// Type-specific numeric payload.
    pub impact: EventImpact,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Per-system projection included in a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SettledSystem {
    /// Catalog identifier.
    pub system_id: SystemId,
    /// Number of inhabitants.
    pub population: u64,
    /// Technology level.
    pub tech_level: f64,
    /// Political cohesion in `[0, 1]`.
    pub internal_cohesion: f64,
    /// Whether an independence movement is active.
    pub has_independence_movement: bool,
    /// Production for the last tick.
    pub economic_output: f64,
    /// Production minus consumption for the last tick.
    pub trade_balance: f64,
}

impl SettledSystem {
    /// Project a system's state under its identifier.
    pub fn project(system_id: &SystemId, state: &SystemState) -> Self {
        Self {
            system_id: system_id.clone(),
            population: state.population,
            tech_level: state.tech_level,
            internal_cohesion: state.internal_cohesion,
            has_independence_movement: state.has_independence_movement,
            economic_output: state.economic_output,
            trade_balance: state.trade_balance,
        }
    }
}

/// Immutable point-in-time view of a run.
///
/// Contains no wall-clock data: two engines built from the same inputs
/// produce equal snapshots at equal ticks. Wall-clock metadata is attached
/// by [`Snapshot::document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Run identifier.
    pub run_id: String,
    /// Number of completed ticks.
    pub tick: u64,
    /// `tick * year_per_tick`.
    pub simulated_year: f64,
    /// Lifecycle state when the snapshot was taken.
    pub state: RunState,
    /// Number of settled systems.
    pub systems_populated: u64,
    /// Sum of all systems' populations.
    pub total_population: u64,
    /// Settled systems in identifier order.
    pub settled_systems: Vec<SettledSystem>,
    /// The most recent events, oldest first.
    pub events: Vec<EventRecord>,
    /// Seed every random stream of the run derives from.
    pub seed: u64,
    /// Version of the model rule set.
    pub model_version: String,
    /// World build the run was created from.
    pub source_build_id: String,
}

impl Snapshot {
    /// Attach the run's creation time for serialization to API clients.
    pub fn document(self, created_at: DateTime<Utc>) -> SnapshotDocument {
        SnapshotDocument {
            snapshot: self,
            created_at,
        }
    }

    /// Look up one settled system by identifier.
    pub fn system(&self, system_id: &str) -> Option<&SettledSystem> {
        self.settled_systems
            .iter()
            .find(|system| system.system_id.as_str() == system_id)
    }
}

/// A [`Snapshot`] plus wall-clock metadata, as served to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SnapshotDocument {
    /// The deterministic snapshot body.
    #[serde(flatten)]
    pub snapshot: Snapshot,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

/// A page of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventPage {
    /// Events with `tick > after_tick`, in log order.
    pub events: Vec<EventRecord>,
    /// How many events matched before the limit was applied.
    pub total_count: u64,
    /// The run's tick when the page was read.
    pub current_tick: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        let sol = SystemId::from("Sol");
        let state = SystemState::colony(10_000_000, 5.0, 0.7);
        Snapshot {
            run_id: String::from("sim_0000abcd"),
            tick: 4,
            simulated_year: 1.0,
            state: RunState::Running,
            systems_populated: 1,
            total_population: 10_000_000,
            settled_systems: vec![SettledSystem::project(&sol, &state)],
            events: vec![EventRecord {
                event_id: EventId::from_random_bits(7),
                tick: 3,
                event_type: EventKind::Discovery,
                location: sol,
                description: String::from("Scientific discovery in Sol"),
                impact: EventImpact::TechGain { amount: 0.1 },
            }],
            seed: 12345,
            model_version: String::from("0.1.0"),
            source_build_id: String::from("wb_test"),
        }
    }

    #[test]
    fn document_flattens_snapshot_fields() {
        let created_at = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let value = serde_json::to_value(sample_snapshot().document(created_at)).unwrap();

        assert_eq!(value["run_id"], "sim_0000abcd");
        assert_eq!(value["state"], "running");
        assert_eq!(value["systems_populated"], 1);
        assert_eq!(value["settled_systems"][0]["system_id"], "Sol");
        assert_eq!(value["events"][0]["event_type"], "discovery");
        assert_eq!(value["events"][0]["impact"]["kind"], "tech_gain");
        assert!(value["created_at"].as_str().unwrap().starts_with("2026-01-01"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = sample_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn system_lookup() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.system("Sol").map(|s| s.population), Some(10_000_000));
        assert!(snapshot.system("Vega").is_none());
    }
}
