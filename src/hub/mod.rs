//! Broadcast hub.
//!
//! The hub is the single authority for connection membership and the shared
//! counter.
//!
//! # Architecture
//!
//! ```text
//!  inbound duty ──increment()──┐
//!  inbound duty ──increment()──┤      ┌──────────────────────┐
//!  upgrade      ──join()───────┼─────►│  control loop        │──try_send──► queue A
//!  inbound duty ──unregister()─┘      │  (owns Membership)   │──try_send──► queue B
//!                                     └──────────────────────┘──try_send──► queue C
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Hub`] handle and control loop |
//! | `counter` | [`SharedCounter`] with publish lock |
//! | `membership` | [`Membership`] set and broadcast fan-out |

// ============================================================================
// Submodules
// ============================================================================

/// Hub handle and control loop.
pub mod core;

/// Shared counter.
pub mod counter;

/// Membership set owned by the control loop.
pub mod membership;

// ============================================================================
// Types
// ============================================================================

/// One outbound message: a UTF-8 text frame body.
///
/// Cloning is cheap, so one broadcast shares a single buffer across all
/// connection queues.
pub type Payload = tokio_tungstenite::tungstenite::Utf8Bytes;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{DEFAULT_QUEUE_CAPACITY, Hub, WeakHub};
pub use counter::SharedCounter;
pub use membership::{BroadcastReport, Eviction, Membership, OutboundSender};
