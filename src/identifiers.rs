//! Type-safe identifiers.
//!
//! Newtype wrappers keep connection identities from being confused with
//! counter values or other integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// ConnectionId
// ============================================================================

/// Next connection ID to hand out. Starts at 1; IDs are never reused.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one WebSocket connection.
///
/// Unique for the lifetime of the process. The hub keys its membership set
/// by this ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates a fresh, process-unique connection ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
