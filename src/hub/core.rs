//! Hub handle and control loop.
//!
//! A [`Hub`] is a cheap, cloneable handle to one control task. Every
//! membership change and every broadcast is sent to that task as a
//! [`HubEvent`] over a single unbounded channel and processed strictly in
//! arrival order, so the membership set is never touched concurrently.
//!
//! # Ordering
//!
//! Counter increments do not go through the control task. They use the
//! [`SharedCounter`] publish lock instead: the atomic increment and the
//! enqueue of its broadcast happen under the lock, and so does the read of
//! a joining connection's seed value together with its registration. The
//! control channel therefore carries counter values in order, and a joining
//! connection sees its seed followed by exactly every later value.

// ============================================================================
// Imports
// ============================================================================

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

use super::counter::SharedCounter;
use super::membership::{Eviction, Membership, OutboundSender};
use super::Payload;

// ============================================================================
// Constants
// ============================================================================

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

// ============================================================================
// HubEvent
// ============================================================================

/// Events processed by the control loop.
enum HubEvent {
    /// Add a connection to the membership set.
    Register {
        id: ConnectionId,
        outbound: OutboundSender,
    },
    /// Remove a connection, closing its queue.
    Unregister(ConnectionId),
    /// Deliver a payload to every member.
    Broadcast(Payload),
    /// Report the current membership.
    Members(oneshot::Sender<Vec<ConnectionId>>),
    /// Close every queue and stop the loop.
    Shutdown(oneshot::Sender<()>),
}

// ============================================================================
// Hub
// ============================================================================

/// Handle to the broadcast hub.
///
/// The control task runs while at least one `Hub` handle exists and
/// [`Hub::shutdown`] has not been called. Connections hold a [`WeakHub`]
/// and never keep the hub alive.
///
/// # Example
///
/// ```ignore
/// let hub = Hub::spawn(0, DEFAULT_QUEUE_CAPACITY);
/// let value = hub.increment()?;
/// assert_eq!(value, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Hub {
    /// Control channel into the loop.
    events: mpsc::UnboundedSender<HubEvent>,
    /// Shared counter.
    counter: Arc<SharedCounter>,
    /// Capacity for new connection queues.
    queue_capacity: usize,
}

// ============================================================================
// Hub - Constructor
// ============================================================================

impl Hub {
    /// Spawns the control loop and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `initial_count` - Starting value of the shared counter
    /// * `queue_capacity` - Outbound queue capacity per connection (min 1)
    #[must_use]
    pub fn spawn(initial_count: i64, queue_capacity: usize) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_control_loop(events_rx));

        debug!(initial_count, queue_capacity, "Hub started");

        Self {
            events,
            counter: Arc::new(SharedCounter::new(initial_count)),
            queue_capacity: queue_capacity.max(1),
        }
    }
}

// ============================================================================
// Hub - Public API
// ============================================================================

impl Hub {
    /// Adds a connection to the membership set.
    ///
    /// Call at most once per connection. The queue is not seeded; use
    /// [`Hub::join`] for a connection that must see the current value first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HubClosed`] if the control loop has stopped.
    pub fn register(&self, id: ConnectionId, outbound: OutboundSender) -> Result<()> {
        self.send(HubEvent::Register { id, outbound })
    }

    /// Seeds a connection's queue with the current counter value and
    /// registers it, with no increment able to slip in between.
    ///
    /// Returns the seed value.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the queue cannot take the seed
    /// - [`Error::HubClosed`] if the control loop has stopped
    pub fn join(&self, id: ConnectionId, outbound: OutboundSender) -> Result<i64> {
        self.counter.snapshot_with(|value| {
            outbound
                .try_send(Payload::from(value.to_string()))
                .map_err(|_| Error::ConnectionClosed)?;
            self.send(HubEvent::Register { id, outbound })?;
            Ok(value)
        })
    }

    /// Removes a connection if present and closes its queue.
    ///
    /// Idempotent. Does nothing once the hub has stopped, since stopping
    /// already closed every queue.
    pub fn unregister(&self, id: ConnectionId) {
        if self.send(HubEvent::Unregister(id)).is_err() {
            trace!(connection_id = %id, "Unregister after hub shutdown");
        }
    }

    /// Delivers a payload to every registered connection.
    ///
    /// Never waits on a connection: a member whose queue is full is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HubClosed`] if the control loop has stopped.
    pub fn broadcast(&self, payload: impl Into<Payload>) -> Result<()> {
        self.send(HubEvent::Broadcast(payload.into()))
    }

    /// Increments the shared counter and broadcasts the new value.
    ///
    /// Returns the value produced by this increment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HubClosed`] if the control loop has stopped.
    pub fn increment(&self) -> Result<i64> {
        self.counter.increment_with(|value| {
            self.send(HubEvent::Broadcast(Payload::from(value.to_string())))?;
            Ok(value)
        })
    }

    /// Returns the current counter value.
    #[inline]
    #[must_use]
    pub fn count(&self) -> i64 {
        self.counter.get()
    }

    /// Returns the outbound queue capacity used for new connections.
    #[inline]
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Returns the registered connection IDs, after every event sent before
    /// this call has been processed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HubClosed`] if the control loop has stopped.
    pub async fn members(&self) -> Result<Vec<ConnectionId>> {
        let (tx, rx) = oneshot::channel();
        self.send(HubEvent::Members(tx))?;
        rx.await.map_err(|_| Error::HubClosed)
    }

    /// Returns the number of registered connections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HubClosed`] if the control loop has stopped.
    pub async fn connection_count(&self) -> Result<usize> {
        Ok(self.members().await?.len())
    }

    /// Closes every connection queue and stops the control loop.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(HubEvent::Shutdown(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Returns `true` once the control loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Creates a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakHub {
        WeakHub {
            events: self.events.downgrade(),
            counter: Arc::downgrade(&self.counter),
            queue_capacity: self.queue_capacity,
        }
    }

    fn send(&self, event: HubEvent) -> Result<()> {
        self.events.send(event).map_err(|_| Error::HubClosed)
    }
}

// ============================================================================
// WeakHub
// ============================================================================

/// Non-owning reference to a [`Hub`].
///
/// Held by connections so that the hub's lifetime is decided by its owner,
/// not by its clients.
#[derive(Debug, Clone)]
pub struct WeakHub {
    events: mpsc::WeakUnboundedSender<HubEvent>,
    counter: Weak<SharedCounter>,
    queue_capacity: usize,
}

impl WeakHub {
    /// Returns a strong handle if the hub is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Hub> {
        Some(Hub {
            events: self.events.upgrade()?,
            counter: self.counter.upgrade()?,
            queue_capacity: self.queue_capacity,
        })
    }
}

// ============================================================================
// Control Loop
// ============================================================================

/// Processes hub events one at a time until shutdown or until every
/// strong handle is dropped.
async fn run_control_loop(mut events: mpsc::UnboundedReceiver<HubEvent>) {
    let mut membership = Membership::new();

    while let Some(event) = events.recv().await {
        match event {
            HubEvent::Register { id, outbound } => {
                if membership.register(id, outbound) {
                    info!(connection_id = %id, members = membership.len(), "Connection registered");
                } else {
                    warn!(connection_id = %id, "Duplicate registration ignored");
                }
            }

            HubEvent::Unregister(id) => {
                if membership.unregister(id) {
                    info!(connection_id = %id, members = membership.len(), "Connection unregistered");
                }
            }

            HubEvent::Broadcast(payload) => {
                let report = membership.broadcast(&payload);

                for (id, reason) in &report.evicted {
                    match reason {
                        Eviction::QueueFull => {
                            warn!(connection_id = %id, "Outbound queue full, dropping connection");
                        }
                        Eviction::QueueClosed => {
                            debug!(connection_id = %id, "Outbound queue closed, dropping connection");
                        }
                    }
                }

                trace!(
                    payload = %payload.as_str(),
                    delivered = report.delivered,
                    evicted = report.evicted.len(),
                    "Broadcast"
                );
            }

            HubEvent::Members(reply) => {
                let _ = reply.send(membership.ids());
            }

            HubEvent::Shutdown(done) => {
                let closed = membership.clear();
                info!(closed, "Hub shutting down");
                let _ = done.send(());
                break;
            }
        }
    }

    membership.clear();
    debug!("Hub control loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
