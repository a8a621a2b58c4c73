//! HTTP server.
//!
//! Hosts the WebSocket endpoint, the increment endpoint and static files on
//! one listener.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | [`ServerConfig`] and its builder |
//! | `core` | [`Server`] lifecycle and router |
//! | `increment` | `GET /changenumber` handler |

// ============================================================================
// Submodules
// ============================================================================

/// Server configuration and builder.
pub mod config;

/// Server lifecycle and routing.
pub mod core;

/// Stateless increment endpoint.
pub mod increment;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{INCREMENT_PATH, Server, WS_PATH, router};
pub use config::{DEFAULT_BIND_ADDR, DEFAULT_STATIC_DIR, ServerConfig, ServerConfigBuilder};
pub use increment::{IncrementError, change_number, increment_number};
