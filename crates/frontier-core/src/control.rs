//! Shared control flag for pausing an in-flight run.
//!
//! The flag is an [`AtomicBool`] behind an [`Arc`], so a controller on
//! another thread can raise it without taking the lock the tick loop holds.
//! The engine checks it only between ticks; a tick that has started always
//! completes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A pause request shared between an engine and its controllers.
#[derive(Debug, Clone, Default)]
pub struct PauseSignal {
    requested: Arc<AtomicBool>,
}

impl PauseSignal {
    /// A signal with no pause requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the tick loop to stop at the next tick boundary.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Withdraw a pause request.
    pub fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }

    /// Whether a pause has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
