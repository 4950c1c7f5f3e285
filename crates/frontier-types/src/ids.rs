//! Identifier wrappers.
//!
//! Star systems are keyed by their catalog `main_id` (e.g. `"Sol"`), so
//! [`SystemId`] wraps a string and orders lexicographically. That ordering
//! is the iteration order of every per-system loop in the engine.
//!
//! [`EventId`] wraps a [`Uuid`], but unlike most UUIDs in the workspace it
//! is never generated from the OS entropy source: the engine builds it from
//! bytes drawn off a seeded stream, so replaying a run reproduces its ids.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Catalog identifier of a star system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct SystemId(pub String);

impl SystemId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SystemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SystemId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SystemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a single entry in a run's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct EventId(pub Uuid);

impl EventId {
    /// Build an identifier from 128 bits of seeded randomness.
    ///
    /// The version and variant bits are set so the result is a valid v4
    /// UUID; only the source of the bits differs from [`Uuid::new_v4`].
    pub fn from_random_bits(bits: u128) -> Self {
        Self(uuid::Builder::from_random_bytes(bits.to_be_bytes()).into_uuid())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_ids_order_lexicographically() {
        let mut ids = vec![
            SystemId::from("Tau Ceti"),
            SystemId::from("Sol"),
            SystemId::from("Alpha Centauri"),
        ];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(SystemId::as_str).collect();
        assert_eq!(names, vec!["Alpha Centauri", "Sol", "Tau Ceti"]);
    }

    #[test]
    fn system_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SystemId::from("Sol")).unwrap_or_default();
        assert_eq!(json, "\"Sol\"");
    }

    #[test]
    fn event_id_is_stable_for_the_same_bits() {
        let a = EventId::from_random_bits(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let b = EventId::from_random_bits(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(a, b);
        assert_eq!(a.into_inner().get_version_num(), 4);
    }
}
