//! Simulation engine: owns one run's world, random streams, and event log,
//! and drives them through the run lifecycle.
//!
//! ```text
//!            run / step      pause, walltime
//!   idle ─────────────────▶ running ─────▶ paused
//!     │                      │  ▲            │
//!     │ pause                │  └── resume ──┘
//!     └──────▶ paused        │
//!                            │ tick target reached (run)
//!                            ▼
//!                        completed
//! ```
//!
//! Any invariant violation moves the run to `failed`, a terminal state.
//!
//! Every tick is computed on a working copy of the world and the streams
//! and committed only once the whole tick has succeeded, so no caller ever
//! observes a partially applied tick. The pause signal and the walltime
//! budget are checked between ticks only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use frontier_types::{EventPage, RunState, Snapshot, SnapshotDocument, SystemId, SystemState};
use tracing::{debug, error, info, warn};

use crate::config::SimulationConfig;
use crate::control::PauseSignal;
use crate::events::EventGenerator;
use crate::log::EventLog;
use crate::population::{MigrationPressure, NoMigration};
use crate::rng::{RngStreams, derive_stream_seed};
use crate::tick::{self, TickError, TickSummary};
use crate::world::WorldState;

/// Errors returned by engine control calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The caller passed an unusable argument or configuration.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong.
        reason: String,
    },

    /// The run's state does not allow this call.
    #[error("run {run_id} is {state} and cannot advance")]
    NotRunnable {
        /// The run.
        run_id: String,
        /// Its current state.
        state: RunState,
    },

    /// The run already reached its tick target.
    #[error("run {run_id} completed at tick {tick}")]
    AlreadyCompleted {
        /// The run.
        run_id: String,
        /// The tick it completed at.
        tick: u64,
    },

    /// A tick broke a model invariant; the run is now failed.
    #[error("run {run_id} failed at tick {tick}: {reason}")]
    InvariantViolation {
        /// The run.
        run_id: String,
        /// The tick that was being executed.
        tick: u64,
        /// The violated invariant.
        reason: String,
    },

    /// The tick counter is exhausted.
    #[error("run {run_id} cannot advance beyond tick u64::MAX")]
    TickOverflow {
        /// The run.
        run_id: String,
    },
}

/// Identity of one run. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRun {
    /// Run identifier.
    pub run_id: String,
    /// World build the run was created from.
    pub world_build_id: String,
    /// First settled system.
    pub starting_system: SystemId,
    /// Seed every random stream derives from.
    pub seed: u64,
    /// Version of the model rule set.
    pub model_version: String,
    /// Build the snapshots credit as their source.
    pub source_build_id: String,
    /// Wall-clock creation time. Never part of a [`Snapshot`].
    pub created_at: DateTime<Utc>,
}

impl SimulationRun {
    /// The identifier a run gets when the caller does not choose one. A
    /// pure function of the creation inputs.
    pub fn derived_run_id(world_build_id: &str, starting_system: &str, seed: u64) -> String {
        let hash = derive_stream_seed(seed, &format!("{world_build_id}/{starting_system}"));
        format!("sim_{:08x}", hash >> 32)
    }
}

/// Hook invoked after every committed tick.
///
/// The registry uses it to publish read views while a long `run` or `step`
/// is in flight.
pub trait TickObserver: Send {
    /// Called after a tick has been committed.
    fn on_tick(&mut self, summary: &TickSummary, engine: &Engine);
}

/// An observer that ignores every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl TickObserver for NoOpObserver {
    fn on_tick(&mut self, _summary: &TickSummary, _engine: &Engine) {}
}

/// A single simulation run.
#[derive(Debug)]
pub struct Engine {
    run: SimulationRun,
    config: Arc<SimulationConfig>,
    world: WorldState,
    streams: RngStreams,
    log: EventLog,
    state: RunState,
    pause: PauseSignal,
    migration: Arc<dyn MigrationPressure>,
    generator: EventGenerator,
}

impl Engine {
    /// Create a run with the default model configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if an identifier is empty.
    pub fn create(
        world_build_id: &str,
        starting_system: &str,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let mut config = SimulationConfig::default();
        config.world.world_build_id = world_build_id.to_owned();
        config.world.starting_system = starting_system.to_owned();
        config.world.seed = seed;
        Self::from_config(config)
    }

    /// Create a run from a full configuration, with the derived run id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if the configuration is
    /// invalid or names an unknown event type.
    pub fn from_config(config: SimulationConfig) -> Result<Self, EngineError> {
        let run_id = SimulationRun::derived_run_id(
            &config.world.world_build_id,
            &config.world.starting_system,
            config.world.seed,
        );
        Self::new(run_id, config)
    }

    /// Create a run with an explicit identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if an identifier is empty,
    /// the configuration is invalid, or it names an unknown event type.
    pub fn new(run_id: impl Into<String>, config: SimulationConfig) -> Result<Self, EngineError> {
        let run_id = run_id.into();
        let invalid = |reason: String| EngineError::InvalidArgument { reason };
        if run_id.trim().is_empty() {
            return Err(invalid(String::from("run_id must not be empty")));
        }
        if config.world.starting_system.trim().is_empty() {
            return Err(invalid(String::from("starting_system must not be empty")));
        }
        config.validate().map_err(|e| invalid(e.to_string()))?;
        let generator = EventGenerator::new(&config.events).map_err(|e| invalid(e.to_string()))?;

        let starting_system = SystemId::new(config.world.starting_system.trim());
        let run = SimulationRun {
            run_id,
            world_build_id: config.world.world_build_id.clone(),
            starting_system: starting_system.clone(),
            seed: config.world.seed,
            model_version: config.run.model_version.clone(),
            source_build_id: config.world.world_build_id.clone(),
            created_at: Utc::now(),
        };
        let colony = SystemState::colony(
            config.run.initial_population,
            config.run.initial_tech_level,
            config.run.initial_cohesion,
        );

        info!(
            run_id = %run.run_id,
            world_build_id = %run.world_build_id,
            starting_system = %run.starting_system,
            seed = run.seed,
            model_version = %run.model_version,
            "Simulation run created"
        );

        Ok(Self {
            world: WorldState::founded(starting_system, colony),
            streams: RngStreams::new(run.seed),
            log: EventLog::new(),
            state: RunState::Idle,
            pause: PauseSignal::new(),
            migration: Arc::new(NoMigration),
            generator,
            config: Arc::new(config),
            run,
        })
    }

    /// Replace the migration pressure hook.
    #[must_use]
    pub fn with_migration(mut self, migration: Arc<dyn MigrationPressure>) -> Self {
        self.migration = migration;
        self
    }

    /// The run's identity.
    pub const fn identity(&self) -> &SimulationRun {
        &self.run
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Number of completed ticks.
    pub const fn tick(&self) -> u64 {
        self.world.tick()
    }

    /// The committed world state.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// The model configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Every event logged so far.
    pub const fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// A handle that can pause an in-flight [`run`](Self::run) from another
    /// thread.
    pub fn pause_signal(&self) -> PauseSignal {
        self.pause.clone()
    }

    /// Settle an additional system with `population` colonists. Returns
    /// `false` if the system is already settled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] for an empty id or zero
    /// population, and fails on completed or failed runs.
    pub fn settle(&mut self, system_id: &str, population: u64) -> Result<bool, EngineError> {
        self.ensure_not_terminal("settle")?;
        let system_id = system_id.trim();
        if system_id.is_empty() {
            return Err(EngineError::InvalidArgument {
                reason: String::from("system_id must not be empty"),
            });
        }
        if population == 0 {
            return Err(EngineError::InvalidArgument {
                reason: format!("cannot settle {system_id} with zero population"),
            });
        }
        let colony = SystemState::colony(
            population,
            self.config.run.initial_tech_level,
            self.config.run.initial_cohesion,
        );
        let settled = self.world.settle(SystemId::new(system_id), colony);
        if settled {
            info!(
                run_id = %self.run.run_id,
                tick = self.tick(),
                system = system_id,
                population,
                "System settled"
            );
        }
        Ok(settled)
    }

    /// Advance exactly `n` ticks, ignoring any walltime budget. Returns the
    /// tick reached.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if `n` is zero,
    /// [`EngineError::NotRunnable`] on a paused or failed run,
    /// [`EngineError::AlreadyCompleted`] on a completed run, and
    /// [`EngineError::InvariantViolation`] if a tick fails.
    pub fn step(&mut self, n: u64) -> Result<u64, EngineError> {
        self.step_with(n, &mut NoOpObserver)
    }

    /// [`step`](Self::step), notifying `observer` after every tick.
    ///
    /// # Errors
    ///
    /// Same as [`step`](Self::step).
    pub fn step_with(
        &mut self,
        n: u64,
        observer: &mut dyn TickObserver,
    ) -> Result<u64, EngineError> {
        if n == 0 {
            warn!(run_id = %self.run.run_id, "Rejected step of zero ticks");
            return Err(EngineError::InvalidArgument {
                reason: String::from("step interval must be at least 1"),
            });
        }
        self.ensure_runnable("step")?;
        self.start();

        for _ in 0..n {
            let summary = self.advance_one()?;
            observer.on_tick(&summary, self);
        }
        Ok(self.tick())
    }

    /// Advance up to `max_ticks` more ticks, stopping early if the walltime
    /// budget runs out or a pause is requested. Returns `true` only if all
    /// `max_ticks` ticks ran, which completes the run.
    ///
    /// Stopping early for either reason leaves the run `paused`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotRunnable`] on a paused or failed run,
    /// [`EngineError::AlreadyCompleted`] on a completed run, and
    /// [`EngineError::InvariantViolation`] if a tick fails.
    pub fn run(
        &mut self,
        max_ticks: u64,
        max_walltime: Option<Duration>,
    ) -> Result<bool, EngineError> {
        self.run_with(max_ticks, max_walltime, &mut NoOpObserver)
    }

    /// [`run`](Self::run), notifying `observer` after every tick.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_with(
        &mut self,
        max_ticks: u64,
        max_walltime: Option<Duration>,
        observer: &mut dyn TickObserver,
    ) -> Result<bool, EngineError> {
        self.ensure_runnable("run")?;
        self.start();

        let started = Instant::now();
        let target = self.tick().saturating_add(max_ticks);
        info!(
            run_id = %self.run.run_id,
            tick = self.tick(),
            max_ticks,
            max_walltime_ms = max_walltime.map(|d| d.as_millis()),
            "Run starting"
        );

        while self.tick() < target {
            if self.pause.is_requested() {
                self.state = RunState::Paused;
                info!(run_id = %self.run.run_id, tick = self.tick(), "Run paused at tick boundary");
                return Ok(false);
            }
            if max_walltime.is_some_and(|budget| started.elapsed() >= budget) {
                self.state = RunState::Paused;
                info!(
                    run_id = %self.run.run_id,
                    tick = self.tick(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Walltime budget exhausted, run paused"
                );
                return Ok(false);
            }
            let summary = self.advance_one()?;
            observer.on_tick(&summary, self);
        }

        self.state = RunState::Completed;
        info!(
            run_id = %self.run.run_id,
            tick = self.tick(),
            total_population = self.world.total_population(),
            events = self.log.len(),
            "Run completed"
        );
        Ok(true)
    }

    /// Pause the run. Pausing a paused run is a no-op; pausing an idle run
    /// parks it before its first tick.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyCompleted`] on a completed run and
    /// [`EngineError::NotRunnable`] on a failed one.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        self.ensure_not_terminal("pause")?;
        if self.state != RunState::Paused {
            self.state = RunState::Paused;
            info!(run_id = %self.run.run_id, tick = self.tick(), "Run paused");
        }
        Ok(())
    }

    /// Resume a paused run. Resuming a run that is not paused is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyCompleted`] on a completed run and
    /// [`EngineError::NotRunnable`] on a failed one.
    pub fn resume(&mut self) -> Result<(), EngineError> {
        self.ensure_not_terminal("resume")?;
        self.pause.clear();
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            info!(run_id = %self.run.run_id, tick = self.tick(), "Run resumed");
        }
        Ok(())
    }

    /// Immutable projection of the committed state. Never mutates.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            run_id: self.run.run_id.clone(),
            tick: self.world.tick(),
            simulated_year: self.world.simulated_year(self.config.run.year_per_tick),
            state: self.state,
            systems_populated: u64::try_from(self.world.systems.len()).unwrap_or(u64::MAX),
            total_population: self.world.total_population(),
            settled_systems: self.world.settled_systems(),
            events: self.log.tail(self.config.run.snapshot_event_window),
            seed: self.run.seed,
            model_version: self.run.model_version.clone(),
            source_build_id: self.run.source_build_id.clone(),
        }
    }

    /// [`snapshot`](Self::snapshot) with the run's creation time attached.
    pub fn document(&self) -> SnapshotDocument {
        self.snapshot().document(self.run.created_at)
    }

    /// The first `limit` events with `tick > after_tick`.
    pub fn events(&self, after_tick: u64, limit: usize) -> EventPage {
        self.log.page(after_tick, limit, self.tick())
    }

    fn start(&mut self) {
        if self.state == RunState::Idle {
            self.state = RunState::Running;
            info!(run_id = %self.run.run_id, "Run started");
        }
    }

    fn ensure_not_terminal(&self, operation: &'static str) -> Result<(), EngineError> {
        match self.state {
            RunState::Completed => {
                warn!(run_id = %self.run.run_id, operation, "Rejected call on completed run");
                Err(EngineError::AlreadyCompleted {
                    run_id: self.run.run_id.clone(),
                    tick: self.tick(),
                })
            }
            RunState::Failed => {
                warn!(run_id = %self.run.run_id, operation, "Rejected call on failed run");
                Err(EngineError::NotRunnable {
                    run_id: self.run.run_id.clone(),
                    state: self.state,
                })
            }
            RunState::Idle | RunState::Running | RunState::Paused => Ok(()),
        }
    }

    fn ensure_runnable(&self, operation: &'static str) -> Result<(), EngineError> {
        self.ensure_not_terminal(operation)?;
        if self.state == RunState::Paused {
            warn!(run_id = %self.run.run_id, operation, "Rejected call on paused run");
            return Err(EngineError::NotRunnable {
                run_id: self.run.run_id.clone(),
                state: self.state,
            });
        }
        Ok(())
    }

    /// Run one tick on working copies and commit it.
    fn advance_one(&mut self) -> Result<TickSummary, EngineError> {
        let mut world = self.world.clone();
        let mut streams = self.streams.clone();
        match tick::run_tick(
            &mut world,
            &mut streams,
            &self.config,
            self.migration.as_ref(),
            &self.generator,
        ) {
            Ok(summary) => {
                self.world = world;
                self.streams = streams;
                self.log.append_tick(summary.events.clone());
                for event in &summary.events {
                    debug!(
                        run_id = %self.run.run_id,
                        tick = event.tick,
                        event_type = %event.event_type,
                        location = %event.location,
                        "{}",
                        event.description
                    );
                }
                Ok(summary)
            }
            Err(TickError::TickOverflow) => Err(EngineError::TickOverflow {
                run_id: self.run.run_id.clone(),
            }),
            Err(err) => Err(self.fail(&world, &err)),
        }
    }

    /// Move to `failed` and report the state the failing tick produced.
    fn fail(&mut self, working: &WorldState, err: &TickError) -> EngineError {
        self.state = RunState::Failed;
        let tick = self.tick().saturating_add(1);
        let dump = serde_json::to_string(&working.settled_systems())
            .unwrap_or_else(|e| format!("<state dump unavailable: {e}>"));
        error!(
            run_id = %self.run.run_id,
            tick,
            error = %err,
            state = %dump,
            "Run failed: invariant violated"
        );
        EngineError::InvariantViolation {
            run_id: self.run.run_id.clone(),
            tick,
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::EventKind;

    use super::*;

    fn engine(seed: u64) -> Engine {
        Engine::create("wb_test", "Sol", seed).unwrap()
    }

    #[test]
    fn create_starts_idle_at_tick_zero() {
        let engine = engine(42);
        let snapshot = engine.snapshot();
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.systems_populated, 1);
        assert_eq!(snapshot.total_population, 10_000_000);
        assert_eq!(snapshot.source_build_id, "wb_test");
        assert!(snapshot.events.is_empty());
    }

    #[test]
    fn run_id_is_derived_from_creation_inputs() {
        let a = engine(42);
        let b = engine(42);
        let c = engine(43);
        assert_eq!(a.identity().run_id, b.identity().run_id);
        assert_ne!(a.identity().run_id, c.identity().run_id);
        assert!(a.identity().run_id.starts_with("sim_"));
        assert_eq!(a.identity().run_id.len(), 12);
    }

    #[test]
    fn empty_starting_system_is_rejected() {
        assert!(matches!(
            Engine::create("wb_test", "  ", 1),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn unknown_event_type_is_invalid_argument() {
        let mut config = SimulationConfig::default();
        config.events.enabled = vec![String::from("plague")];
        assert!(matches!(
            Engine::from_config(config),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn step_zero_is_invalid() {
        let mut engine = engine(1);
        assert!(matches!(engine.step(0), Err(EngineError::InvalidArgument { .. })));
        assert_eq!(engine.state(), RunState::Idle);
    }

    #[test]
    fn step_moves_idle_to_running() {
        let mut engine = engine(1);
        assert_eq!(engine.step(3).unwrap(), 3);
        assert_eq!(engine.state(), RunState::Running);
        let snapshot = engine.snapshot();
        assert!((snapshot.simulated_year - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut engine = engine(5);
        engine.step(4).unwrap();
        let first = engine.snapshot();
        let second = engine.snapshot();
        assert_eq!(first, second);
        assert_eq!(engine.tick(), 4);
    }

    #[test]
    fn paused_run_rejects_step_and_run() {
        let mut engine = engine(1);
        engine.step(1).unwrap();
        engine.pause().unwrap();
        assert!(matches!(engine.step(1), Err(EngineError::NotRunnable { .. })));
        assert!(matches!(engine.run(10, None), Err(EngineError::NotRunnable { .. })));
        engine.resume().unwrap();
        assert_eq!(engine.step(1).unwrap(), 2);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut engine = engine(1);
        engine.pause().unwrap();
        let before = engine.snapshot();
        engine.pause().unwrap();
        assert_eq!(engine.state(), RunState::Paused);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn resume_when_not_paused_is_a_no_op() {
        let mut engine = engine(1);
        engine.resume().unwrap();
        assert_eq!(engine.state(), RunState::Idle);
        engine.step(1).unwrap();
        engine.resume().unwrap();
        assert_eq!(engine.state(), RunState::Running);
    }

    #[test]
    fn run_completes_at_tick_target() {
        let mut engine = engine(9);
        assert!(engine.run(20, None).unwrap());
        assert_eq!(engine.tick(), 20);
        assert_eq!(engine.state(), RunState::Completed);
        assert!(matches!(engine.step(1), Err(EngineError::AlreadyCompleted { tick: 20, .. })));
        assert!(matches!(engine.run(30, None), Err(EngineError::AlreadyCompleted { .. })));
        assert!(matches!(engine.pause(), Err(EngineError::AlreadyCompleted { .. })));
        assert!(matches!(engine.resume(), Err(EngineError::AlreadyCompleted { .. })));
        // Reads still work.
        assert_eq!(engine.snapshot().state, RunState::Completed);
    }

    #[test]
    fn max_ticks_counts_from_the_current_tick() {
        let mut engine = engine(9);
        engine.step(5).unwrap();
        assert!(engine.run(8, None).unwrap());
        assert_eq!(engine.tick(), 13);
    }

    #[test]
    fn zero_walltime_pauses_before_any_tick() {
        let mut engine = engine(9);
        assert!(!engine.run(100, Some(Duration::ZERO)).unwrap());
        assert_eq!(engine.tick(), 0);
        assert_eq!(engine.state(), RunState::Paused);
        assert!(matches!(engine.run(100, None), Err(EngineError::NotRunnable { .. })));

        engine.resume().unwrap();
        assert!(engine.run(100, None).unwrap());
        assert_eq!(engine.tick(), 100);
    }

    #[test]
    fn pause_signal_stops_run_at_boundary() {
        struct PauseAfter {
            signal: PauseSignal,
            at: u64,
        }
        impl TickObserver for PauseAfter {
            fn on_tick(&mut self, summary: &TickSummary, _engine: &Engine) {
                if summary.tick == self.at {
                    self.signal.request();
                }
            }
        }

        let mut engine = engine(3);
        let mut observer = PauseAfter {
            signal: engine.pause_signal(),
            at: 7,
        };
        assert!(!engine.run_with(50, None, &mut observer).unwrap());
        assert_eq!(engine.tick(), 7);
        assert_eq!(engine.state(), RunState::Paused);

        engine.resume().unwrap();
        assert!(!engine.pause_signal().is_requested());
        assert!(engine.run(50, None).unwrap());
    }

    #[test]
    fn settle_adds_a_system() {
        let mut engine = engine(1);
        assert!(engine.settle("Alpha Centauri", 50_000).unwrap());
        assert!(!engine.settle("Sol", 1).unwrap());
        assert!(matches!(
            engine.settle("Tau Ceti", 0),
            Err(EngineError::InvalidArgument { .. })
        ));
        engine.step(2).unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.systems_populated, 2);
        assert!(snapshot.system("Alpha Centauri").unwrap().population > 50_000);
    }

    #[test]
    fn invariant_violation_fails_only_this_run() {
        let mut config = SimulationConfig::default();
        config.world.starting_system = String::from("Sol");
        let mut engine = Engine::new("sim_broken", config).unwrap();
        let before = engine.snapshot();

        // Corrupt the model configuration behind the engine's back.
        Arc::make_mut(&mut engine.config).politics.trade_weight = f64::NAN;

        let err = engine.step(3).unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation { tick: 1, .. }));
        assert_eq!(engine.state(), RunState::Failed);
        // The partial tick was discarded.
        assert_eq!(engine.tick(), 0);
        assert_eq!(engine.snapshot().settled_systems, before.settled_systems);
        assert!(matches!(engine.step(1), Err(EngineError::NotRunnable { .. })));
        assert!(matches!(engine.pause(), Err(EngineError::NotRunnable { .. })));
    }

    #[test]
    fn events_page_and_snapshot_window() {
        let mut config = SimulationConfig::default();
        config.events.discovery_chance = 1.0;
        config.run.snapshot_event_window = 3;
        let mut engine = Engine::from_config(config).unwrap();
        engine.step(10).unwrap();

        // Discovery fires every tick at probability one.
        let page = engine.events(5, 2);
        assert_eq!(page.current_tick, 10);
        assert_eq!(page.events.len(), 2);
        assert!(page.events.iter().all(|e| e.tick > 5));
        assert!(page.total_count >= 5);
        assert_eq!(engine.snapshot().events.len(), 3);
        assert!(
            engine
                .event_log()
                .iter()
                .filter(|e| e.event_type == EventKind::Discovery)
                .count()
                >= 10
        );
    }

    #[test]
    fn document_adds_created_at() {
        let engine = engine(1);
        let document = engine.document();
        assert_eq!(document.created_at, engine.identity().created_at);
        assert_eq!(document.snapshot, engine.snapshot());
    }
}
