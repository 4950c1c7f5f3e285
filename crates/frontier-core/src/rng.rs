//! Deterministic random number streams.
//!
//! Nothing in the simulation may touch a platform RNG. All randomness flows
//! through named [`StreamRng`] instances derived from the run's single seed:
//!
//! ```text
//! stream_seed = splitmix64(seed ^ fnv1a64(stream_name))
//! ```
//!
//! Each model component owns its stream, and each event type owns a child
//! stream under `events/` plus an identifier stream under
//! `events/<type>/ids`, so introducing a new stochastic consumer never
//! shifts the draws of an existing one. Streams are `StdRng` instances; their
//! sequences are stable for a given `rand` release, which is all the
//! reproducibility contract asks for.

use frontier_types::EventKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a over the bytes of a stream name.
fn fnv1a64(name: &str) -> u64 {
    name.bytes().fold(FNV_OFFSET_BASIS, |state, byte| {
        (state ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of the stream called `name` under the run seed `seed`.
pub fn derive_stream_seed(seed: u64, name: &str) -> u64 {
    splitmix64(seed ^ fnv1a64(name))
}

/// A named, deterministic random sequence owned by one consumer.
#[derive(Debug, Clone)]
pub struct StreamRng {
    name: String,
    inner: StdRng,
}

impl StreamRng {
    /// Derive the stream called `name` from the run seed.
    pub fn derive(seed: u64, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            inner: StdRng::seed_from_u64(derive_stream_seed(seed, name)),
        }
    }

    /// Name the stream was derived under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uniform draw in `[0, 1)`.
    pub fn roll(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    /// Bernoulli trial with probability `p`. Always consumes one draw.
    pub fn chance(&mut self, p: f64) -> bool {
        self.roll() < p
    }

    /// Uniform draw in `[-amplitude, amplitude)`. Always consumes one draw,
    /// even for a zero amplitude.
    pub fn jitter(&mut self, amplitude: f64) -> f64 {
        self.roll().mul_add(2.0, -1.0) * amplitude
    }

    /// Uniform draw in `[lo, hi)`; returns `lo` when the range is empty.
    /// Always consumes one draw.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let u = self.roll();
        if hi <= lo {
            return lo;
        }
        (hi - lo).mul_add(u, lo)
    }

    /// Uniform index in `[0, len)`, or `None` for an empty range. Always
    /// consumes one draw.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        let raw = self.inner.random::<u64>();
        let len_u64 = u64::try_from(len).ok()?;
        let index = raw.checked_rem(len_u64)?;
        usize::try_from(index).ok()
    }

    /// 128 raw bits, used for event identifiers.
    pub fn bits(&mut self) -> u128 {
        self.inner.random::<u128>()
    }
}

/// Every random stream of one run.
#[derive(Debug, Clone)]
pub struct RngStreams {
    /// Drives technology drift in the population model.
    pub population: StreamRng,
    /// Drives productivity fluctuation in the economy model.
    pub economy: StreamRng,
    /// Drives cohesion noise in the politics model.
    pub politics: StreamRng,
    /// One stream per event type, indexed in priority order.
    events: [StreamRng; 5],
    /// Identifier bits for each event type's logged events, same order.
    event_ids: [StreamRng; 5],
}

impl RngStreams {
    /// Derive all streams from the run seed.
    pub fn new(seed: u64) -> Self {
        Self {
            population: StreamRng::derive(seed, "population"),
            economy: StreamRng::derive(seed, "economy"),
            politics: StreamRng::derive(seed, "politics"),
            events: EventKind::ALL.map(|kind| StreamRng::derive(seed, &format!("events/{kind}"))),
            event_ids: EventKind::ALL
                .map(|kind| StreamRng::derive(seed, &format!("events/{kind}/ids"))),
        }
    }

    /// The stream owned by one event type.
    pub fn events(&mut self, kind: EventKind) -> &mut StreamRng {
        by_kind(&mut self.events, kind)
    }

    /// The identifier stream of one event type. Drawn once per logged event
    /// of that type only.
    pub fn event_ids(&mut self, kind: EventKind) -> &mut StreamRng {
        by_kind(&mut self.event_ids, kind)
    }
}

fn by_kind(streams: &mut [StreamRng; 5], kind: EventKind) -> &mut StreamRng {
    let [discovery, conflict, migration, shortage, breakthrough] = streams;
    match kind {
        EventKind::Discovery => discovery,
        EventKind::Conflict => conflict,
        EventKind::MigrationWave => migration,
        EventKind::ResourceShortage => shortage,
        EventKind::TechBreakthrough => breakthrough,
    }
}
