//! Run registry: maps run identifiers to engines and serializes control
//! calls per run.
//!
//! # Architecture
//!
//! Each run lives in its own slot holding:
//!
//! - the [`Engine`] behind an owned [`tokio::sync::Mutex`]. Mutating calls
//!   take it with `try_lock`, so a second concurrent caller is rejected
//!   with [`RegistryError::Busy`] instead of queueing. `pause` is the
//!   exception: it raises the run's [`PauseSignal`] and then waits for the
//!   in-flight tick to finish.
//! - a [`watch`] channel carrying the latest [`RunView`]. The engine
//!   publishes a new view after every committed tick and every state
//!   change, so `snapshot` and `events` read the channel and never wait on
//!   a tick.
//!
//! The map itself sits behind an [`RwLock`] that is only held long enough
//! to look up or insert a slot; no lock spans more than one run.
//!
//! Tick loops execute on blocking worker threads, one per in-flight call,
//! so many runs can advance concurrently without sharing any mutable state.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use frontier_types::{EventPage, RunState, SnapshotDocument};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::control::PauseSignal;
use crate::engine::{Engine, EngineError, TickObserver};
use crate::log::EventLog;
use crate::tick::TickSummary;

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No run with this identifier exists.
    #[error("run not found: {run_id}")]
    NotFound {
        /// The requested run.
        run_id: String,
    },

    /// Another mutating call on this run is in flight.
    #[error("run {run_id} is busy with another control call")]
    Busy {
        /// The contended run.
        run_id: String,
    },

    /// The engine rejected the call.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The worker thread running the tick loop died.
    #[error("worker for run {run_id} failed: {reason}")]
    Worker {
        /// The run whose worker failed.
        run_id: String,
        /// The join error.
        reason: String,
    },
}

/// A consistent read view of one run, published between ticks.
#[derive(Debug, Clone)]
pub struct RunView {
    /// Snapshot with creation time attached.
    pub document: SnapshotDocument,
    /// The full event log at the same tick.
    pub log: EventLog,
}

impl RunView {
    fn capture(engine: &Engine) -> Self {
        Self {
            document: engine.document(),
            log: engine.event_log().clone(),
        }
    }

    /// Run identifier.
    pub fn run_id(&self) -> &str {
        &self.document.snapshot.run_id
    }

    /// Lifecycle state at publication.
    pub const fn state(&self) -> RunState {
        self.document.snapshot.state
    }

    /// Tick at publication.
    pub const fn tick(&self) -> u64 {
        self.document.snapshot.tick
    }

    /// The first `limit` events with `tick > after_tick`.
    pub fn events(&self, after_tick: u64, limit: usize) -> EventPage {
        self.log.page(after_tick, limit, self.tick())
    }
}

/// A subscription to one run's published views.
#[derive(Debug, Clone)]
pub struct RunHandle {
    run_id: String,
    views: watch::Receiver<Arc<RunView>>,
}

impl RunHandle {
    /// Run identifier.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The most recently published view.
    pub fn latest(&self) -> Arc<RunView> {
        Arc::clone(&self.views.borrow())
    }

    /// Wait for the next published view. Returns `None` once the run has
    /// been removed from the registry and no further views will come.
    pub async fn changed(&mut self) -> Option<Arc<RunView>> {
        self.views.changed().await.ok()?;
        Some(Arc::clone(&self.views.borrow_and_update()))
    }
}

/// Publishes a fresh view after every committed tick.
struct Publisher {
    views: Arc<watch::Sender<Arc<RunView>>>,
}

impl Publisher {
    fn publish(&self, engine: &Engine) {
        self.views.send_replace(Arc::new(RunView::capture(engine)));
    }
}

impl TickObserver for Publisher {
    fn on_tick(&mut self, _summary: &TickSummary, engine: &Engine) {
        self.publish(engine);
    }
}

struct RunSlot {
    engine: Arc<Mutex<Engine>>,
    pause: PauseSignal,
    views: Arc<watch::Sender<Arc<RunView>>>,
}

impl RunSlot {
    fn new(engine: Engine) -> Self {
        let pause = engine.pause_signal();
        let (views, _) = watch::channel(Arc::new(RunView::capture(&engine)));
        Self {
            engine: Arc::new(Mutex::new(engine)),
            pause,
            views: Arc::new(views),
        }
    }

    fn handle(&self, run_id: &str) -> RunHandle {
        RunHandle {
            run_id: run_id.to_owned(),
            views: self.views.subscribe(),
        }
    }

    fn publisher(&self) -> Publisher {
        Publisher {
            views: Arc::clone(&self.views),
        }
    }

    fn view(&self) -> Arc<RunView> {
        Arc::clone(&self.views.borrow())
    }
}

/// Every active run of the hosting process.
pub struct Registry {
    config: Arc<SimulationConfig>,
    runs: RwLock<BTreeMap<String, Arc<RunSlot>>>,
}

impl Registry {
    /// A registry whose runs use `config` for every model parameter. The
    /// `world` section is overridden per run.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config: Arc::new(config),
            runs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a run under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Engine`] if the engine rejects the inputs.
    pub async fn create(
        &self,
        world_build_id: &str,
        starting_system: &str,
        seed: u64,
    ) -> Result<RunHandle, RegistryError> {
        let mut runs = self.runs.write().await;
        let run_id = loop {
            let candidate = format!("sim_{:08x}", Uuid::new_v4().as_u128() >> 96);
            if !runs.contains_key(&candidate) {
                break candidate;
            }
        };
        let engine = Engine::new(
            run_id.clone(),
            self.run_config(world_build_id, starting_system, seed),
        )?;
        let slot = Arc::new(RunSlot::new(engine));
        let handle = slot.handle(&run_id);
        runs.insert(run_id, slot);
        Ok(handle)
    }

    /// Return the run called `run_id`, creating it from the given inputs if
    /// it does not exist. An existing run is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Engine`] if a new engine rejects the inputs.
    pub async fn get_or_create(
        &self,
        run_id: &str,
        world_build_id: &str,
        starting_system: &str,
        seed: u64,
    ) -> Result<RunHandle, RegistryError> {
        let mut runs = self.runs.write().await;
        if let Some(slot) = runs.get(run_id) {
            return Ok(slot.handle(run_id));
        }
        let engine = Engine::new(
            run_id,
            self.run_config(world_build_id, starting_system, seed),
        )?;
        let slot = Arc::new(RunSlot::new(engine));
        let handle = slot.handle(run_id);
        runs.insert(run_id.to_owned(), slot);
        Ok(handle)
    }

    /// Subscribe to an existing run.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown run.
    pub async fn handle(&self, run_id: &str) -> Result<RunHandle, RegistryError> {
        Ok(self.slot(run_id).await?.handle(run_id))
    }

    /// Advance exactly `n` ticks and return the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Busy`], or
    /// the engine's rejection.
    pub async fn step(&self, run_id: &str, n: u64) -> Result<SnapshotDocument, RegistryError> {
        let slot = self.slot(run_id).await?;
        let guard = Self::claim(&slot, run_id)?;
        let mut publisher = slot.publisher();
        Self::on_worker(run_id, move || {
            let mut engine = guard;
            let result = engine.step_with(n, &mut publisher);
            publisher.publish(&engine);
            result.map(|_| engine.document())
        })
        .await
    }

    /// Advance up to `max_ticks` more ticks, stopping early on the walltime
    /// budget or a pause. Returns `true` if every tick ran.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Busy`], or
    /// the engine's rejection.
    pub async fn run(
        &self,
        run_id: &str,
        max_ticks: u64,
        max_walltime: Option<Duration>,
    ) -> Result<bool, RegistryError> {
        let slot = self.slot(run_id).await?;
        let guard = Self::claim(&slot, run_id)?;
        let mut publisher = slot.publisher();
        Self::on_worker(run_id, move || {
            let mut engine = guard;
            let result = engine.run_with(max_ticks, max_walltime, &mut publisher);
            publisher.publish(&engine);
            result
        })
        .await
    }

    /// Pause the run, waiting for an in-flight tick to finish first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] or the engine's rejection.
    pub async fn pause(&self, run_id: &str) -> Result<(), RegistryError> {
        let slot = self.slot(run_id).await?;
        slot.pause.request();
        let mut engine = slot.engine.lock().await;
        let result = engine.pause();
        slot.pause.clear();
        slot.publisher().publish(&engine);
        result.map_err(RegistryError::from)
    }

    /// Resume a paused run.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Busy`], or
    /// the engine's rejection.
    pub async fn resume(&self, run_id: &str) -> Result<(), RegistryError> {
        let slot = self.slot(run_id).await?;
        let mut engine = Self::claim(&slot, run_id)?;
        let result = engine.resume();
        slot.publisher().publish(&engine);
        result.map_err(RegistryError::from)
    }

    /// Settle an additional system in the run.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::Busy`], or
    /// the engine's rejection.
    pub async fn settle(
        &self,
        run_id: &str,
        system_id: &str,
        population: u64,
    ) -> Result<bool, RegistryError> {
        let slot = self.slot(run_id).await?;
        let mut engine = Self::claim(&slot, run_id)?;
        let settled = engine.settle(system_id, population)?;
        slot.publisher().publish(&engine);
        Ok(settled)
    }

    /// The latest published snapshot. Never waits on a tick.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown run.
    pub async fn snapshot(&self, run_id: &str) -> Result<SnapshotDocument, RegistryError> {
        Ok(self.slot(run_id).await?.view().document.clone())
    }

    /// The first `limit` events with `tick > after_tick` from the latest
    /// published view. Never waits on a tick.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown run.
    pub async fn events(
        &self,
        run_id: &str,
        after_tick: u64,
        limit: usize,
    ) -> Result<EventPage, RegistryError> {
        Ok(self.slot(run_id).await?.view().events(after_tick, limit))
    }

    /// Latest view of every run, in identifier order.
    pub async fn list(&self) -> Vec<Arc<RunView>> {
        self.runs.read().await.values().map(|slot| slot.view()).collect()
    }

    /// Abandon a run. An in-flight call on it is asked to stop at the next
    /// tick boundary; no other run is affected.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown run.
    pub async fn remove(&self, run_id: &str) -> Result<(), RegistryError> {
        let slot = self
            .runs
            .write()
            .await
            .remove(run_id)
            .ok_or_else(|| RegistryError::NotFound {
                run_id: run_id.to_owned(),
            })?;
        slot.pause.request();
        info!(run_id, "Run removed from registry");
        Ok(())
    }

    fn run_config(
        &self,
        world_build_id: &str,
        starting_system: &str,
        seed: u64,
    ) -> SimulationConfig {
        let mut config = SimulationConfig::clone(&self.config);
        world_build_id.clone_into(&mut config.world.world_build_id);
        starting_system.clone_into(&mut config.world.starting_system);
        config.world.seed = seed;
        config
    }

    async fn slot(&self, run_id: &str) -> Result<Arc<RunSlot>, RegistryError> {
        self.runs
            .read()
            .await
            .get(run_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                run_id: run_id.to_owned(),
            })
    }

    fn claim(slot: &RunSlot, run_id: &str) -> Result<OwnedMutexGuard<Engine>, RegistryError> {
        Arc::clone(&slot.engine).try_lock_owned().map_err(|_locked| {
            warn!(run_id, "Rejected concurrent control call");
            RegistryError::Busy {
                run_id: run_id.to_owned(),
            }
        })
    }

    async fn on_worker<T, F>(run_id: &str, work: F) -> Result<T, RegistryError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    {
        tokio::task::spawn_blocking(work)
            .await
            .map_err(|e| RegistryError::Worker {
                run_id: run_id.to_owned(),
                reason: e.to_string(),
            })?
            .map_err(RegistryError::from)
    }
}
