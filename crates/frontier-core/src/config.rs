//! Configuration loading and typed config structures for the Frontier
//! simulation.
//!
//! The canonical configuration lives in `frontier-config.yaml` at the
//! project root. Every field has a default, so an empty document is a valid
//! configuration and reproduces the reference model (10M colonists, 2% logistic
//! growth per quarter-year tick, capacity of one billion per system).
//!
//! Coefficients of the politics model and the independence hysteresis
//! thresholds are deliberately exposed here rather than baked into the
//! model code.

use std::collections::BTreeMap;
use std::path::Path;

use frontier_types::EventKind;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The document parsed but a value is unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Which world the headless binary simulates.
    #[serde(default)]
    pub world: WorldConfig,

    /// Initial colony and model metadata.
    #[serde(default)]
    pub run: RunConfig,

    /// Population model parameters.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Economy model parameters.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Politics model parameters.
    #[serde(default)]
    pub politics: PoliticsConfig,

    /// Event generator parameters.
    #[serde(default)]
    pub events: EventsConfig,

    /// Bounds for a headless `run`.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value the models rely on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.population.validate()?;
        self.economy.validate()?;
        self.politics.validate()?;
        self.events.validate()?;
        Ok(())
    }
}

/// Identity of the world the headless binary simulates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// World build produced by the inference pipeline.
    #[serde(default = "default_world_build_id")]
    pub world_build_id: String,

    /// Catalog id of the first settled system.
    #[serde(default = "default_starting_system")]
    pub starting_system: String,

    /// Seed every random stream derives from.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_build_id: default_world_build_id(),
            starting_system: default_starting_system(),
            seed: default_seed(),
        }
    }
}

/// Initial colony and model metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    /// Version of the model rule set, recorded in every snapshot.
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Simulated years per tick.
    #[serde(default = "default_year_per_tick")]
    pub year_per_tick: f64,

    /// Population of the starting system.
    #[serde(default = "default_initial_population")]
    pub initial_population: u64,

    /// Technology level of a new settlement.
    #[serde(default = "default_initial_tech_level")]
    pub initial_tech_level: f64,

    /// Cohesion of a new settlement.
    #[serde(default = "default_initial_cohesion")]
    pub initial_cohesion: f64,

    /// How many of the latest events a snapshot carries.
    #[serde(default = "default_snapshot_event_window")]
    pub snapshot_event_window: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model_version: default_model_version(),
            year_per_tick: default_year_per_tick(),
            initial_population: default_initial_population(),
            initial_tech_level: default_initial_tech_level(),
            initial_cohesion: default_initial_cohesion(),
            snapshot_event_window: default_snapshot_event_window(),
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("run.year_per_tick", self.year_per_tick)?;
        require_non_negative("run.initial_tech_level", self.initial_tech_level)?;
        require_unit("run.initial_cohesion", self.initial_cohesion)?;
        if self.initial_population == 0 {
            return Err(invalid("run.initial_population must be at least 1"));
        }
        Ok(())
    }
}

/// Population model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Logistic growth rate per tick.
    #[serde(default = "default_growth_rate")]
    pub growth_rate: f64,

    /// Population at which growth stops.
    #[serde(default = "default_carrying_capacity")]
    pub carrying_capacity: f64,

    /// Mean technology gain per tick.
    #[serde(default = "default_tech_growth_per_tick")]
    pub tech_growth_per_tick: f64,

    /// Amplitude of the uniform noise added to the technology gain.
    #[serde(default = "default_tech_noise")]
    pub tech_noise: f64,

    /// Per-system overrides keyed by catalog id.
    #[serde(default)]
    pub systems: BTreeMap<String, GrowthOverride>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            growth_rate: default_growth_rate(),
            carrying_capacity: default_carrying_capacity(),
            tech_growth_per_tick: default_tech_growth_per_tick(),
            tech_noise: default_tech_noise(),
            systems: BTreeMap::new(),
        }
    }
}

impl PopulationConfig {
    /// Growth rate and carrying capacity in effect for one system.
    pub fn growth_for(&self, system_id: &str) -> (f64, f64) {
        let overrides = self.systems.get(system_id);
        (
            overrides
                .and_then(|o| o.growth_rate)
                .unwrap_or(self.growth_rate),
            overrides
                .and_then(|o| o.carrying_capacity)
                .unwrap_or(self.carrying_capacity),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("population.growth_rate", self.growth_rate)?;
        require_positive("population.carrying_capacity", self.carrying_capacity)?;
        require_finite("population.tech_growth_per_tick", self.tech_growth_per_tick)?;
        require_non_negative("population.tech_noise", self.tech_noise)?;
        for (system_id, o) in &self.systems {
            if let Some(rate) = o.growth_rate {
                require_finite(&format!("population.systems.{system_id}.growth_rate"), rate)?;
            }
            if let Some(capacity) = o.carrying_capacity {
                require_positive(
                    &format!("population.systems.{system_id}.carrying_capacity"),
                    capacity,
                )?;
            }
        }
        Ok(())
    }
}

/// Per-system population overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct GrowthOverride {
    /// Replaces [`PopulationConfig::growth_rate`] for this system.
    #[serde(default)]
    pub growth_rate: Option<f64>,
    /// Replaces [`PopulationConfig::carrying_capacity`] for this system.
    #[serde(default)]
    pub carrying_capacity: Option<f64>,
}

/// Economy model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EconomyConfig {
    /// Output per inhabitant per technology level.
    #[serde(default = "default_productivity")]
    pub productivity: f64,

    /// Relative amplitude of the per-tick productivity fluctuation.
    #[serde(default = "default_productivity_noise")]
    pub productivity_noise: f64,

    /// Consumption per inhabitant per tick.
    #[serde(default = "default_consumption_per_capita")]
    pub consumption_per_capita: f64,

    /// Trade balance below which a system becomes a shortage candidate.
    #[serde(default = "default_shortage_low_water")]
    pub shortage_low_water: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            productivity: default_productivity(),
            productivity_noise: default_productivity_noise(),
            consumption_per_capita: default_consumption_per_capita(),
            shortage_low_water: default_shortage_low_water(),
        }
    }
}

impl EconomyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("economy.productivity", self.productivity)?;
        require_unit("economy.productivity_noise", self.productivity_noise)?;
        require_non_negative("economy.consumption_per_capita", self.consumption_per_capita)?;
        require_finite("economy.shortage_low_water", self.shortage_low_water)
    }
}

/// Politics model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoliticsConfig {
    /// Weight of the (saturated) relative trade balance in the cohesion update.
    #[serde(default = "default_trade_weight")]
    pub trade_weight: f64,

    /// Weight of this tick's technology change in the cohesion update.
    #[serde(default = "default_tech_weight")]
    pub tech_weight: f64,

    /// Amplitude of the uniform noise added to the cohesion update.
    #[serde(default = "default_cohesion_noise")]
    pub cohesion_noise: f64,

    /// Cohesion below which an independence movement can start.
    #[serde(default = "default_independence_trigger")]
    pub independence_trigger: f64,

    /// Cohesion above which an active movement dissolves.
    #[serde(default = "default_independence_recovery")]
    pub independence_recovery: f64,

    /// Population a system needs before a movement can start.
    #[serde(default = "default_independence_min_population")]
    pub independence_min_population: u64,
}

impl Default for PoliticsConfig {
    fn default() -> Self {
        Self {
            trade_weight: default_trade_weight(),
            tech_weight: default_tech_weight(),
            cohesion_noise: default_cohesion_noise(),
            independence_trigger: default_independence_trigger(),
            independence_recovery: default_independence_recovery(),
            independence_min_population: default_independence_min_population(),
        }
    }
}

impl PoliticsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_finite("politics.trade_weight", self.trade_weight)?;
        require_finite("politics.tech_weight", self.tech_weight)?;
        require_non_negative("politics.cohesion_noise", self.cohesion_noise)?;
        require_unit("politics.independence_trigger", self.independence_trigger)?;
        require_unit("politics.independence_recovery", self.independence_recovery)?;
        if self.independence_recovery <= self.independence_trigger {
            return Err(invalid(
                "politics.independence_recovery must be above politics.independence_trigger",
            ));
        }
        Ok(())
    }
}

/// Event generator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventsConfig {
    /// Event types that may be logged. Disabled types still consume draws.
    #[serde(default = "default_enabled_events")]
    pub enabled: Vec<String>,

    /// Base per-tick chance of a spontaneous discovery.
    #[serde(default = "default_discovery_chance")]
    pub discovery_chance: f64,

    /// Technology gained from a discovery.
    #[serde(default = "default_discovery_tech_gain")]
    pub discovery_tech_gain: f64,

    /// Per-tick chance of conflict in an unstable system.
    #[serde(default = "default_conflict_chance")]
    pub conflict_chance: f64,

    /// Cohesion below which a system is unstable.
    #[serde(default = "default_conflict_cohesion")]
    pub conflict_cohesion: f64,

    /// Cohesion lost to a conflict.
    #[serde(default = "default_conflict_cohesion_loss")]
    pub conflict_cohesion_loss: f64,

    /// Per-tick chance of a migration wave to an attractive system.
    #[serde(default = "default_migration_chance")]
    pub migration_chance: f64,

    /// Cohesion above which a system attracts migrants.
    #[serde(default = "default_migration_min_cohesion")]
    pub migration_min_cohesion: f64,

    /// Technology level above which a system attracts migrants.
    #[serde(default = "default_migration_min_tech")]
    pub migration_min_tech: f64,

    /// Smallest population fraction a wave brings.
    #[serde(default = "default_migration_gain_min")]
    pub migration_gain_min: f64,

    /// Largest population fraction a wave brings.
    #[serde(default = "default_migration_gain_max")]
    pub migration_gain_max: f64,

    /// Per-tick chance that a shortage candidate logs a shortage.
    #[serde(default = "default_shortage_chance")]
    pub shortage_chance: f64,

    /// Cohesion lost to a shortage.
    #[serde(default = "default_shortage_cohesion_loss")]
    pub shortage_cohesion_loss: f64,

    /// Per-tick chance of a breakthrough somewhere in settled space.
    #[serde(default = "default_breakthrough_chance")]
    pub breakthrough_chance: f64,

    /// Technology gained from a breakthrough.
    #[serde(default = "default_breakthrough_tech_gain")]
    pub breakthrough_tech_gain: f64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_events(),
            discovery_chance: default_discovery_chance(),
            discovery_tech_gain: default_discovery_tech_gain(),
            conflict_chance: default_conflict_chance(),
            conflict_cohesion: default_conflict_cohesion(),
            conflict_cohesion_loss: default_conflict_cohesion_loss(),
            migration_chance: default_migration_chance(),
            migration_min_cohesion: default_migration_min_cohesion(),
            migration_min_tech: default_migration_min_tech(),
            migration_gain_min: default_migration_gain_min(),
            migration_gain_max: default_migration_gain_max(),
            shortage_chance: default_shortage_chance(),
            shortage_cohesion_loss: default_shortage_cohesion_loss(),
            breakthrough_chance: default_breakthrough_chance(),
            breakthrough_tech_gain: default_breakthrough_tech_gain(),
        }
    }
}

impl EventsConfig {
    /// Resolve the `enabled` names into event types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a name that is not an event type.
    pub fn enabled_kinds(&self) -> Result<Vec<EventKind>, ConfigError> {
        let mut kinds = self
            .enabled
            .iter()
            .map(|name| {
                name.parse::<EventKind>().map_err(|err| ConfigError::Invalid {
                    reason: format!("events.enabled: {err}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        kinds.sort();
        kinds.dedup();
        Ok(kinds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let _ = self.enabled_kinds()?;
        require_unit("events.discovery_chance", self.discovery_chance)?;
        require_non_negative("events.discovery_tech_gain", self.discovery_tech_gain)?;
        require_unit("events.conflict_chance", self.conflict_chance)?;
        require_unit("events.conflict_cohesion", self.conflict_cohesion)?;
        require_unit("events.conflict_cohesion_loss", self.conflict_cohesion_loss)?;
        require_unit("events.migration_chance", self.migration_chance)?;
        require_unit("events.migration_min_cohesion", self.migration_min_cohesion)?;
        require_non_negative("events.migration_min_tech", self.migration_min_tech)?;
        require_non_negative("events.migration_gain_min", self.migration_gain_min)?;
        require_non_negative("events.migration_gain_max", self.migration_gain_max)?;
        if self.migration_gain_max < self.migration_gain_min {
            return Err(invalid(
                "events.migration_gain_max must not be below events.migration_gain_min",
            ));
        }
        require_unit("events.shortage_chance", self.shortage_chance)?;
        require_unit("events.shortage_cohesion_loss", self.shortage_cohesion_loss)?;
        require_unit("events.breakthrough_chance", self.breakthrough_chance)?;
        require_non_negative("events.breakthrough_tech_gain", self.breakthrough_tech_gain)
    }
}

/// Bounds for a headless `run`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Tick target of the run.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Wall-clock budget in seconds (0 = unlimited).
    #[serde(default)]
    pub max_walltime_seconds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            max_walltime_seconds: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

fn require_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be finite, got {value}")))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value < 0.0 {
        return Err(invalid(&format!("{name} must not be negative, got {value}")));
    }
    Ok(())
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value <= 0.0 {
        return Err(invalid(&format!("{name} must be positive, got {value}")));
    }
    Ok(())
}

fn require_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(&format!("{name} must lie in [0, 1], got {value}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_build_id() -> String {
    "wb_local".to_owned()
}

fn default_starting_system() -> String {
    "Sol".to_owned()
}

const fn default_seed() -> u64 {
    42
}

fn default_model_version() -> String {
    "0.1.0".to_owned()
}

const fn default_year_per_tick() -> f64 {
    0.25
}

const fn default_initial_population() -> u64 {
    10_000_000
}

const fn default_initial_tech_level() -> f64 {
    5.0
}

const fn default_initial_cohesion() -> f64 {
    0.7
}

const fn default_snapshot_event_window() -> usize {
    100
}

const fn default_growth_rate() -> f64 {
    0.02
}

const fn default_carrying_capacity() -> f64 {
    1_000_000_000.0
}

const fn default_tech_growth_per_tick() -> f64 {
    0.025
}

const fn default_tech_noise() -> f64 {
    0.01
}

const fn default_productivity() -> f64 {
    0.001
}

const fn default_productivity_noise() -> f64 {
    0.0
}

const fn default_consumption_per_capita() -> f64 {
    0.004
}

const fn default_shortage_low_water() -> f64 {
    0.0
}

const fn default_trade_weight() -> f64 {
    0.02
}

const fn default_tech_weight() -> f64 {
    0.5
}

const fn default_cohesion_noise() -> f64 {
    0.01
}

const fn default_independence_trigger() -> f64 {
    0.3
}

const fn default_independence_recovery() -> f64 {
    0.5
}

const fn default_independence_min_population() -> u64 {
    1_000_000
}

fn default_enabled_events() -> Vec<String> {
    EventKind::ALL
        .iter()
        .map(|kind| kind.as_str().to_owned())
        .collect()
}

const fn default_discovery_chance() -> f64 {
    0.01
}

const fn default_discovery_tech_gain() -> f64 {
    0.1
}

const fn default_conflict_chance() -> f64 {
    0.1
}

const fn default_conflict_cohesion() -> f64 {
    0.4
}

const fn default_conflict_cohesion_loss() -> f64 {
    0.05
}

const fn default_migration_chance() -> f64 {
    0.02
}

const fn default_migration_min_cohesion() -> f64 {
    0.7
}

const fn default_migration_min_tech() -> f64 {
    8.0
}

const fn default_migration_gain_min() -> f64 {
    0.01
}

const fn default_migration_gain_max() -> f64 {
    0.03
}

const fn default_shortage_chance() -> f64 {
    0.5
}

const fn default_shortage_cohesion_loss() -> f64 {
    0.02
}

const fn default_breakthrough_chance() -> f64 {
    0.001
}

const fn default_breakthrough_tech_gain() -> f64 {
    0.5
}

const fn default_max_ticks() -> u64 {
    400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.starting_system, "Sol");
        assert_eq!(config.run.initial_population, 10_000_000);
        assert_eq!(config.simulation.max_ticks, 400);
        assert_eq!(config.events.enabled.len(), 5);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
world:
  seed: 999
population:
  growth_rate: 0.03
  systems:
    Sol:
      carrying_capacity: 20000000
politics:
  independence_trigger: 0.2
  independence_recovery: 0.6
events:
  enabled: [discovery, conflict]
";
        let config = SimulationConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.world.seed, 999);
        assert_eq!(config.world.world_build_id, "wb_local");
        let (rate, capacity) = config.population.growth_for("Sol");
        assert!((rate - 0.03).abs() < f64::EPSILON);
        assert!((capacity - 20_000_000.0).abs() < f64::EPSILON);
        let (_, default_capacity) = config.population.growth_for("Vega");
        assert!((default_capacity - 1_000_000_000.0).abs() < f64::EPSILON);
        assert_eq!(
            config.events.enabled_kinds().ok(),
            Some(vec![EventKind::Discovery, EventKind::Conflict])
        );
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result = SimulationConfig::parse("events:\n  enabled: [discovery, plague]\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { ref reason }) if reason.contains("plague")
        ));
    }

    #[test]
    fn hysteresis_thresholds_must_be_ordered() {
        let yaml = "politics:\n  independence_trigger: 0.6\n  independence_recovery: 0.4\n";
        assert!(matches!(
            SimulationConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let yaml = "events:\n  conflict_chance: 1.5\n";
        assert!(matches!(
            SimulationConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            SimulationConfig::parse("run: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("frontier-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
