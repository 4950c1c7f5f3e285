//! Enumeration types for the Frontier simulation.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a simulation run.
///
/// ```text
/// idle --run/step--> running --pause--> paused --resume--> running
///                    running --max_ticks reached in run--> completed
///        any non-terminal --invariant violation--> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RunState {
    /// Constructed, no tick executed yet.
    Idle,
    /// Advancing, or ready to advance.
    Running,
    /// Halted by an operator at a tick boundary.
    Paused,
    /// Reached its tick target inside `run`.
    Completed,
    /// Stopped by an internal invariant violation.
    Failed,
}

impl RunState {
    /// Whether no further ticks can ever execute in this state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire name of the state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl core::fmt::Display for RunState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Discrete events
// ---------------------------------------------------------------------------

/// Category of a discrete event.
///
/// Declaration order is emission priority: when several types fire in the
/// same tick, all discoveries are logged before all conflicts, and so on.
/// The derived `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// A scientific discovery in a system.
    Discovery,
    /// Civil or trade conflict in a system.
    Conflict,
    /// An influx of settlers into a prosperous system.
    MigrationWave,
    /// Consumption outran production.
    ResourceShortage,
    /// A rare, globally-scoped technological leap.
    TechBreakthrough,
}

impl EventKind {
    /// Every event type, in emission priority order.
    pub const ALL: [Self; 5] = [
        Self::Discovery,
        Self::Conflict,
        Self::MigrationWave,
        Self::ResourceShortage,
        Self::TechBreakthrough,
    ];

    /// Wire name of the event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Conflict => "conflict",
            Self::MigrationWave => "migration_wave",
            Self::ResourceShortage => "resource_shortage",
            Self::TechBreakthrough => "tech_breakthrough",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event type name that does not match any [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownEventKind(name.to_owned()))
    }
}
