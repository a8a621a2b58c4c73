//! Live Counter - Real-time shared counter over WebSockets.
//!
//! This library serves a single counter to any number of browser clients.
//! Every WebSocket frame a client sends increments the counter, and every
//! new value is pushed to all connected clients.
//!
//! # Architecture
//!
//! The server follows a hub-and-spoke model:
//!
//! - **Hub**: one control task owns connection membership; all joins, leaves
//!   and broadcasts pass through it in order
//! - **Connection**: one WebSocket with an inbound duty (frames become
//!   increments) and an outbound duty (queue drained to the socket)
//! - **Upgrade handler**: turns `GET /ws` into a connection seeded with the
//!   current value
//!
//! Key design principles:
//!
//! - Membership is mutated only by the hub's control task (no locks)
//! - Broadcast never blocks: a client whose queue is full is disconnected
//! - Counter values reach every client in order, without gaps or duplicates
//! - Connections hold only a weak reference to the hub
//!
//! # Quick Start
//!
//! ```no_run
//! use live_counter::{Result, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ServerConfig::builder()
//!         .bind_addr(([127, 0, 0, 1], 8080).into())
//!         .static_dir("./static")
//!         .build()?;
//!
//!     let server = Server::bind(config).await?;
//!     server.run().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`hub`] | [`Hub`], shared counter and membership |
//! | [`transport`] | WebSocket [`Connection`] and upgrade handler |
//! | [`server`] | HTTP [`Server`], routes and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Broadcast hub: membership, shared counter and fan-out.
pub mod hub;

/// Type-safe identifiers.
pub mod identifiers;

/// HTTP server, routes and configuration.
pub mod server;

/// WebSocket transport layer.
///
/// Upgrade handling and per-connection duties.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Hub types
pub use hub::{Hub, Payload, WeakHub};

// Identifier types
pub use identifiers::ConnectionId;

// Server types
pub use server::{Server, ServerConfig, ServerConfigBuilder};

// Transport types
pub use transport::{Connection, ConnectionTasks};
