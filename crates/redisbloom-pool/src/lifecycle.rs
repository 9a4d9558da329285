//! Connection lifecycle tracking.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Sitting in a pool's idle set.
    Idle,
    /// Checked out by exactly one caller.
    InUse,
    /// Unusable; will be discarded instead of returned to the idle set.
    Closed,
}

/// Bookkeeping attached to every pooled connection.
#[derive(Debug, Clone)]
pub struct ConnectionMetadata {
    /// Identifier unique within the owning pool.
    pub id: u64,
    /// Server address the connection is attached to.
    pub address: Arc<str>,
    /// When the connection was opened.
    pub created_at: Instant,
    /// When the connection last completed a command or was opened.
    pub last_used: Instant,
    /// Number of commands completed on this connection.
    pub use_count: u64,
}

impl ConnectionMetadata {
    pub(crate) fn new(id: u64, address: Arc<str>) -> Self {
        let now = Instant::now();
        Self {
            id,
            address,
            created_at: now,
            last_used: now,
            use_count: 0,
        }
    }

    /// Time since the connection was opened.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the connection was last used.
    #[must_use]
    pub fn idle_time(&self) -> Duration {
        self.last_used.elapsed()
    }

    /// Whether the connection has sat unused long enough to need a health check.
    #[must_use]
    pub fn needs_health_check(&self, interval: Duration) -> bool {
        self.idle_time() >= interval
    }

    pub(crate) fn touch(&mut self) {
        self.last_used = Instant::now();
        self.use_count += 1;
    }
}
