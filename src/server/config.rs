//! Server configuration.
//!
//! Provides a fluent builder with validation.
//!
//! # Example
//!
//! ```no_run
//! use live_counter::ServerConfig;
//!
//! # fn example() -> live_counter::Result<()> {
//! let config = ServerConfig::builder()
//!     .bind_addr(([127, 0, 0, 1], 8080).into())
//!     .static_dir("./static")
//!     .queue_capacity(64)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hub::DEFAULT_QUEUE_CAPACITY;

// ============================================================================
// Constants
// ============================================================================

/// Default listen address: all interfaces, port 80.
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 80);

/// Default directory for static files.
pub const DEFAULT_STATIC_DIR: &str = "./static";

// ============================================================================
// ServerConfig
// ============================================================================

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    bind_addr: SocketAddr,
    static_dir: PathBuf,
    queue_capacity: usize,
    initial_count: i64,
}

impl ServerConfig {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Address the HTTP listener binds to.
    #[inline]
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Directory served for every path not handled by a route.
    #[inline]
    #[must_use]
    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Outbound queue capacity per WebSocket connection.
    #[inline]
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Starting value of the shared counter.
    #[inline]
    #[must_use]
    pub fn initial_count(&self) -> i64 {
        self.initial_count
    }
}

// ============================================================================
// ServerConfigBuilder
// ============================================================================

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    bind_addr: SocketAddr,
    static_dir: PathBuf,
    queue_capacity: usize,
    initial_count: i64,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            initial_count: 0,
        }
    }
}

impl ServerConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the listen address. Use port 0 for a random port.
    #[inline]
    #[must_use]
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the static file directory.
    #[inline]
    #[must_use]
    pub fn static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = path.into();
        self
    }

    /// Sets the per-connection outbound queue capacity.
    ///
    /// A client that falls this many messages behind is disconnected.
    #[inline]
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the starting value of the shared counter.
    #[inline]
    #[must_use]
    pub fn initial_count(mut self, count: i64) -> Self {
        self.initial_count = count;
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the queue capacity is zero
    /// - [`Error::Config`] if the static directory does not exist
    pub fn build(self) -> Result<ServerConfig> {
        if self.queue_capacity == 0 {
            return Err(Error::config("queue capacity must be greater than zero"));
        }

        if !self.static_dir.is_dir() {
            return Err(Error::config(format!(
                "static directory not found: {}",
                self.static_dir.display()
            )));
        }

        Ok(ServerConfig {
            bind_addr: self.bind_addr,
            static_dir: self.static_dir,
            queue_capacity: self.queue_capacity,
            initial_count: self.initial_count,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServerConfig::builder()
            .static_dir(dir.path())
            .build()
            .expect("valid config");

        assert_eq!(config.bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(config.bind_addr().port(), 80);
        assert_eq!(config.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.initial_count(), 0);
        assert_eq!(config.static_dir(), dir.path());
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let addr: SocketAddr = "127.0.0.1:0".parse().expect("addr");
        let config = ServerConfig::builder()
            .bind_addr(addr)
            .static_dir(dir.path())
            .queue_capacity(4)
            .initial_count(-3)
            .build()
            .expect("valid config");

        assert_eq!(config.bind_addr(), addr);
        assert_eq!(config.queue_capacity(), 4);
        assert_eq!(config.initial_count(), -3);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ServerConfig::builder()
            .static_dir(dir.path())
            .queue_capacity(0)
            .build()
            .expect_err("must fail");

        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_missing_static_dir_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ServerConfig::builder()
            .static_dir(dir.path().join("missing"))
            .build()
            .expect_err("must fail");

        assert!(err.to_string().contains("static directory not found"));
    }

    #[test]
    fn test_static_file_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let result = ServerConfig::builder().static_dir(file.path()).build();

        assert!(result.is_err());
    }
}
