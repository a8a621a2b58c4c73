//! WebSocket transport layer.
//!
//! This module turns HTTP upgrade requests into hub connections.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Browser        │         WebSocket            │  Connection     │
//! │                 │◄────────────────────────────►│  inbound duty   │──► Hub
//! │  WebSocket      │        GET /ws               │  outbound duty  │◄── queue
//! │  Client         │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ws_upgrade` - Validate handshake, answer `101`
//! 2. `Connection::new` - Wrap upgraded stream, allocate outbound queue
//! 3. `Connection::start` - Seed, register, spawn both duties
//! 4. Either duty ends - Unregister, queue closed, transport closed
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection and its inbound/outbound duties |
//! | `upgrade` | HTTP upgrade handler |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and its duties.
pub mod connection;

/// HTTP-to-WebSocket upgrade handler.
pub mod upgrade;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionTasks};
pub use upgrade::{handshake_response, ws_upgrade};
