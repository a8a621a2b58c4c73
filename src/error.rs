//! Error types for the live counter server.
//!
//! This module defines the error type shared by the hub, the WebSocket
//! transport and the HTTP server.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use live_counter::{Hub, Result};
//!
//! fn bump(hub: &Hub) -> Result<i64> {
//!     let value = hub.increment()?;
//!     Ok(value)
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Startup | [`Error::Config`], [`Error::Bind`] |
//! | Connection | [`Error::Handshake`], [`Error::ConnectionClosed`], [`Error::HubClosed`] |
//! | External | [`Error::Io`], [`Error::WebSocket`] |
//!
//! Only the startup category is fatal to the process. Connection errors end
//! a single connection and never reach the hub's control loop.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::net::SocketAddr;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when server configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Failed to bind the HTTP listener.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to bind.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: IoError,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket handshake rejected.
    ///
    /// The message is sent back to the requester verbatim.
    #[error("WebSocket upgrade failed: {message}")]
    Handshake {
        /// Reason the handshake was rejected.
        message: String,
    },

    /// The connection's outbound queue or transport is closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The hub's control loop has stopped.
    #[error("Hub closed")]
    HubClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    #[inline]
    pub fn bind(addr: SocketAddr, source: IoError) -> Self {
        Self::Bind { addr, source }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error should stop the process.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Bind { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Handshake { .. } | Self::ConnectionClosed | Self::HubClosed | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
