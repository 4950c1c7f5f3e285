//! Discrete event generation.
//!
//! Runs after the three models. Every event type owns a random stream and
//! draws from it a fixed number of times per tick (one roll per system for
//! the per-system types, one roll plus one location pick for the global
//! breakthrough), whether or not its trigger holds and whether or not the
//! type is enabled. A type's draw sequence therefore depends only on the
//! tick count and the settled systems, never on what other types did.
//! Identifiers come from a separate per-type stream, drawn once per logged
//! event of that type.
//!
//! Triggers are evaluated against the post-politics state; impacts are
//! applied afterwards, in emission order. Emission order is type priority
//! ([`EventKind::ALL`]), then system id.

use std::collections::{BTreeMap, BTreeSet};

use frontier_types::{EventId, EventImpact, EventKind, EventRecord, SystemId, SystemState};

use crate::config::{ConfigError, EventsConfig};
use crate::rng::{RngStreams, StreamRng};
use crate::tick::TickContext;

/// An event that fired, before an identifier is assigned.
#[derive(Debug, Clone, PartialEq)]
struct Fired {
    kind: EventKind,
    location: SystemId,
    description: String,
    impact: EventImpact,
}

/// Evaluates triggers and logs events for one run.
#[derive(Debug, Clone)]
pub struct EventGenerator {
    config: EventsConfig,
    enabled: BTreeSet<EventKind>,
}

impl EventGenerator {
    /// Build a generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `enabled` names an unknown type.
    pub fn new(config: &EventsConfig) -> Result<Self, ConfigError> {
        let enabled = config.enabled_kinds()?.into_iter().collect();
        Ok(Self {
            config: config.clone(),
            enabled,
        })
    }

    /// Whether events of this type are logged.
    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Evaluate every trigger, apply the impacts of the events that fired,
    /// and return them as records in emission order.
    pub fn generate(
        &self,
        systems: &mut BTreeMap<SystemId, SystemState>,
        ctx: &TickContext,
        streams: &mut RngStreams,
    ) -> Vec<EventRecord> {
        let mut fired = Vec::new();
        for kind in EventKind::ALL {
            let stream = streams.events(kind);
            let candidates = match kind {
                EventKind::Discovery => self.discoveries(systems, ctx, stream),
                EventKind::Conflict => self.conflicts(systems, ctx, stream),
                EventKind::MigrationWave => self.migration_waves(systems, stream),
                EventKind::ResourceShortage => self.shortages(systems, ctx, stream),
                EventKind::TechBreakthrough => self.breakthrough(systems, stream),
            };
            if self.is_enabled(kind) {
                fired.extend(candidates);
            }
        }

        fired
            .into_iter()
            .map(|event| {
                if let Some(system) = systems.get_mut(&event.location) {
                    apply_impact(system, &event.impact);
                }
                EventRecord {
                    event_id: EventId::from_random_bits(streams.event_ids(event.kind).bits()),
                    tick: ctx.tick,
                    event_type: event.kind,
                    location: event.location,
                    description: event.description,
                    impact: event.impact,
                }
            })
            .collect()
    }

    /// A discovery fires when a system crosses a whole technology level
    /// this tick, or spontaneously with a chance that grows with tech.
    fn discoveries(
        &self,
        systems: &BTreeMap<SystemId, SystemState>,
        ctx: &TickContext,
        stream: &mut StreamRng,
    ) -> Vec<Fired> {
        let mut fired = Vec::new();
        for (system_id, system) in systems {
            let roll = stream.roll();
            let tech_before = ctx
                .tech_before
                .get(system_id)
                .copied()
                .unwrap_or(system.tech_level);
            let crossed = system.tech_level.floor() > tech_before.floor();
            let chance = self.config.discovery_chance * (1.0 + system.tech_level / 20.0);

            let description = if crossed {
                format!(
                    "Settlers of {system_id} reached technology level {}",
                    system.tech_level.floor()
                )
            } else if roll < chance {
                format!("Scientific discovery in {system_id}")
            } else {
                continue;
            };
            fired.push(Fired {
                kind: EventKind::Discovery,
                location: system_id.clone(),
                description,
                impact: EventImpact::TechGain {
                    amount: self.config.discovery_tech_gain,
                },
            });
        }
        fired
    }

    /// Unstable systems (low cohesion or an active independence movement)
    /// may erupt into conflict.
    fn conflicts(
        &self,
        systems: &BTreeMap<SystemId, SystemState>,
        ctx: &TickContext,
        stream: &mut StreamRng,
    ) -> Vec<Fired> {
        let mut fired = Vec::new();
        for (system_id, system) in systems {
            let hit = stream.chance(self.config.conflict_chance);
            let unstable = system.internal_cohesion < self.config.conflict_cohesion
                || system.has_independence_movement;
            if !(unstable && hit) {
                continue;
            }
            let description = if ctx.movements_started.contains(system_id) {
                format!("Independence unrest erupts in {system_id}")
            } else if system.has_independence_movement {
                format!("Separatist clashes continue in {system_id}")
            } else {
                format!("Trade conflict in {system_id}")
            };
            fired.push(Fired {
                kind: EventKind::Conflict,
                location: system_id.clone(),
                description,
                impact: EventImpact::CohesionLoss {
                    amount: self.config.conflict_cohesion_loss,
                },
            });
        }
        fired
    }

    /// Cohesive, advanced systems attract settlers. The wave size is drawn
    /// from the same stream, only when the wave fires.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn migration_waves(
        &self,
        systems: &BTreeMap<SystemId, SystemState>,
        stream: &mut StreamRng,
    ) -> Vec<Fired> {
        let mut fired = Vec::new();
        for (system_id, system) in systems {
            let hit = stream.chance(self.config.migration_chance);
            let attractive = system.internal_cohesion > self.config.migration_min_cohesion
                && system.tech_level > self.config.migration_min_tech;
            if !(attractive && hit) {
                continue;
            }
            let fraction = stream.uniform(
                self.config.migration_gain_min,
                self.config.migration_gain_max,
            );
            let people = (system.population as f64 * fraction)
                .round_ties_even()
                .clamp(0.0, u64::MAX as f64) as u64;
            fired.push(Fired {
                kind: EventKind::MigrationWave,
                location: system_id.clone(),
                description: format!("Migration wave to {system_id}"),
                impact: EventImpact::PopulationGain { fraction, people },
            });
        }
        fired
    }

    /// Systems the economy model flagged may log a shortage.
    fn shortages(
        &self,
        systems: &BTreeMap<SystemId, SystemState>,
        ctx: &TickContext,
        stream: &mut StreamRng,
    ) -> Vec<Fired> {
        let mut fired = Vec::new();
        for system_id in systems.keys() {
            let hit = stream.chance(self.config.shortage_chance);
            let Some(&deficit) = ctx.shortage_candidates.get(system_id) else {
                continue;
            };
            if !hit {
                continue;
            }
            fired.push(Fired {
                kind: EventKind::ResourceShortage,
                location: system_id.clone(),
                description: format!("Resource shortage in {system_id}"),
                impact: EventImpact::Shortage {
                    deficit,
                    cohesion_loss: self.config.shortage_cohesion_loss,
                },
            });
        }
        fired
    }

    /// At most one breakthrough per tick, anywhere in settled space.
    fn breakthrough(
        &self,
        systems: &BTreeMap<SystemId, SystemState>,
        stream: &mut StreamRng,
    ) -> Vec<Fired> {
        let hit = stream.chance(self.config.breakthrough_chance);
        let index = stream.pick(systems.len());
        let location = index.and_then(|i| systems.keys().nth(i));
        match location {
            Some(system_id) if hit => vec![Fired {
                kind: EventKind::TechBreakthrough,
                location: system_id.clone(),
                description: format!("Major tech breakthrough in {system_id}"),
                impact: EventImpact::TechGain {
                    amount: self.config.breakthrough_tech_gain,
                },
            }],
            _ => Vec::new(),
        }
    }
}

/// Apply an event's payload to its system. Population only ever grows here.
pub fn apply_impact(system: &mut SystemState, impact: &EventImpact) {
    match *impact {
        EventImpact::TechGain { amount } => {
            system.tech_level = (system.tech_level + amount).max(0.0);
        }
        EventImpact::CohesionLoss { amount }
        | EventImpact::Shortage {
            cohesion_loss: amount,
            ..
        } => {
            system.internal_cohesion = (system.internal_cohesion - amount).clamp(0.0, 1.0);
        }
        EventImpact::PopulationGain { people, .. } => {
            system.population = system.population.saturating_add(people);
        }
    }
}
