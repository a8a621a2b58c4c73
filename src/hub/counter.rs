//! Process-wide shared counter.
//!
//! The value is an [`AtomicI64`] so any task can read it without locking.
//! Writers go through [`SharedCounter::increment_with`], which holds a short
//! publish lock while the caller enqueues the broadcast for the new value.
//! That lock is what keeps counter values and their broadcasts in the same
//! order in the hub's control channel.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

// ============================================================================
// SharedCounter
// ============================================================================

/// Shared integer counter owned by the [`Hub`](super::Hub).
#[derive(Debug, Default)]
pub struct SharedCounter {
    /// Current value.
    value: AtomicI64,
    /// Serializes "mutate or read + enqueue" sections.
    publish: Mutex<()>,
}

impl SharedCounter {
    /// Creates a counter starting at `seed`.
    #[inline]
    #[must_use]
    pub fn new(seed: i64) -> Self {
        Self {
            value: AtomicI64::new(seed),
            publish: Mutex::new(()),
        }
    }

    /// Returns the current value.
    #[inline]
    #[must_use]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Atomically increments the counter and runs `publish` with the new value
    /// while still holding the publish lock.
    ///
    /// Wraps on overflow.
    pub fn increment_with<R>(&self, publish: impl FnOnce(i64) -> R) -> R {
        let _guard = self.publish.lock();
        let value = self.value.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        publish(value)
    }

    /// Reads the current value and runs `publish` with it while holding the
    /// publish lock, so no increment can be enqueued in between.
    pub fn snapshot_with<R>(&self, publish: impl FnOnce(i64) -> R) -> R {
        let _guard = self.publish.lock();
        publish(self.get())
    }
}

// ============================================================================
// Tests
// ============================================================================
