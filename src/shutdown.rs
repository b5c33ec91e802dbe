//! Cooperative process-shutdown signalling.
//!
//! The read engine polls a [`ShutdownFlag`] once per wait round and unwinds
//! with a partial result when it flips, so no reader stays blocked across
//! program termination. The flag is query-only inside the library; the
//! surrounding application lifecycle owns when to request it (typically from
//! a signal handler or its own shutdown path).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to a process-wide shutdown request.
///
/// All clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Creates a flag with shutdown not yet requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every in-flight blocking operation to wind down.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// True once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
