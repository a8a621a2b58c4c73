//! Connection membership owned by the hub's control loop.
//!
//! [`Membership`] is plain synchronous state. Only the control task touches
//! it, so it needs no locking; every method runs to completion before the
//! next hub event is read.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::identifiers::ConnectionId;

use super::Payload;

// ============================================================================
// Types
// ============================================================================

/// Sending half of a connection's bounded outbound queue.
pub type OutboundSender = mpsc::Sender<Payload>;

/// Why a connection was dropped during a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    /// Outbound queue was full; the client is not keeping up.
    QueueFull,
    /// Outbound duty already exited and dropped its receiver.
    QueueClosed,
}

/// Outcome of one [`Membership::broadcast`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of queues the payload was enqueued on.
    pub delivered: usize,
    /// Connections removed during this broadcast.
    pub evicted: Vec<(ConnectionId, Eviction)>,
}

// ============================================================================
// Membership
// ============================================================================

/// Set of registered connections, keyed by [`ConnectionId`].
///
/// Removing an entry drops the hub's sender, which closes that connection's
/// outbound queue once it is drained.
#[derive(Debug, Default)]
pub struct Membership {
    members: FxHashMap<ConnectionId, OutboundSender>,
}

impl Membership {
    /// Creates an empty membership set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection.
    ///
    /// Returns `false` and keeps the existing entry if `id` is already a
    /// member; the duplicate sender is dropped.
    pub fn register(&mut self, id: ConnectionId, outbound: OutboundSender) -> bool {
        if self.members.contains_key(&id) {
            return false;
        }
        self.members.insert(id, outbound);
        true
    }

    /// Removes a connection and closes its queue.
    ///
    /// Returns `false` if `id` was not a member.
    pub fn unregister(&mut self, id: ConnectionId) -> bool {
        self.members.remove(&id).is_some()
    }

    /// Enqueues `payload` on every member's queue without waiting.
    ///
    /// Members whose queue is full or closed are removed.
    pub fn broadcast(&mut self, payload: &Payload) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (&id, outbound) in &self.members {
            match outbound.try_send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => report.evicted.push((id, Eviction::QueueFull)),
                Err(TrySendError::Closed(_)) => report.evicted.push((id, Eviction::QueueClosed)),
            }
        }

        for (id, _) in &report.evicted {
            self.members.remove(id);
        }

        report
    }

    /// Removes every member, closing all queues. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.members.len();
        self.members.clear();
        count
    }

    /// Returns `true` if `id` is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.members.contains_key(&id)
    }

    /// Number of registered connections.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no connection is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Registered IDs in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self.members.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

// ============================================================================
// Tests
// ============================================================================
