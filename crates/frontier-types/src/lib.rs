//! Shared type definitions for the Frontier expansion simulation.
//!
//! This crate holds every type that crosses the boundary between the
//! simulation core and its consumers (the API layer, the persistence layer
//! and the rendering client). Types flow downstream to `TypeScript` via
//! `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier wrappers for star systems and events
//! - [`enums`] -- Run lifecycle states and event types
//! - [`structs`] -- Per-system state, event records, and snapshots

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{EventKind, RunState, UnknownEventKind};
pub use ids::{EventId, SystemId};
pub use structs::{
    EventImpact, EventPage, EventRecord, SettledSystem, Snapshot, SnapshotDocument, SystemState,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the rendering client.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::SystemId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::enums::RunState::export_all();
        let _ = crate::enums::EventKind::export_all();
        let _ = crate::structs::EventImpact::export_all();
        let _ = crate::structs::EventRecord::export_all();
        let _ = crate::structs::SettledSystem::export_all();
        let _ = crate::structs::Snapshot::export_all();
        let _ = crate::structs::SnapshotDocument::export_all();
        let _ = crate::structs::EventPage::export_all();
    }
}
