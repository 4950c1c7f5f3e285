//! Deterministic tick engine, expansion models, and run registry for the
//! Frontier simulation.
//!
//! A run starts from one settled star system and advances in fixed ticks.
//! Every tick applies the population, economy, and politics models in a
//! fixed order, then rolls for discrete events. All randomness comes from
//! named streams derived from the run's seed, so a run is fully reproducible
//! from `(world_build_id, starting_system, seed)` and a tick count.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `frontier-config.yaml` into
//!   strongly-typed structs.
//! - [`rng`] -- Named deterministic random streams.
//! - [`world`] -- Per-system state and the tick counter.
//! - [`population`], [`economy`], [`politics`] -- The three state models.
//! - [`events`] -- Trigger evaluation and event impacts.
//! - [`tick`] -- The fixed phase order of one tick.
//! - [`log`] -- Append-only event log.
//! - [`control`] -- Pause signal shared with controllers.
//! - [`engine`] -- The run lifecycle state machine and snapshots.
//! - [`registry`] -- Concurrent multi-run control.

pub mod config;
pub mod control;
pub mod economy;
pub mod engine;
pub mod events;
pub mod log;
pub mod politics;
pub mod population;
pub mod registry;
pub mod rng;
pub mod tick;
pub mod world;

pub use engine::{Engine, EngineError, NoOpObserver, SimulationRun, TickObserver};
pub use registry::{Registry, RegistryError, RunHandle, RunView};
