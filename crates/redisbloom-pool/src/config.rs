//! Pool configuration.

use std::time::Duration;

use crate::error::PoolError;

/// Default ceiling on simultaneously in-use connections per address.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 500;

/// Configuration for a connection pool.
///
/// Every sub-pool of a multi-host pool receives its own copy, so the ceiling
/// applies per address.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in use at once.
    pub max_connections: u32,

    /// How long `get` waits for a free slot when the pool is saturated.
    ///
    /// `None` waits indefinitely.
    pub connection_timeout: Option<Duration>,

    /// TCP connect (and AUTH handshake) timeout for new connections.
    pub connect_timeout: Duration,

    /// Per-command reply timeout. `None` disables it.
    pub command_timeout: Option<Duration>,

    /// Idle connections unused for at least this long are checked with
    /// `PING` before being handed out. Zero checks on every borrow.
    pub health_check_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: Some(Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(5),
            command_timeout: None,
            health_check_interval: Duration::from_secs(1),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of in-use connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Set the bounded wait for a free connection slot.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Wait indefinitely for a free connection slot.
    #[must_use]
    pub fn wait_indefinitely(mut self) -> Self {
        self.connection_timeout = None;
        self
    }

    /// Set the TCP connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-command reply timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Set the idle time after which a connection is health-checked on borrow.
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Validate the configuration.
    ///
    /// Rejects a zero ceiling and zero timeouts. A zero
    /// `health_check_interval` is allowed and means every idle connection is
    /// checked on borrow.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.connection_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PoolError::Config(
                "connection_timeout must be greater than 0".into(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(PoolError::Config(
                "connect_timeout must be greater than 0".into(),
            ));
        }
        if self.command_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PoolError::Config(
                "command_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated `host:port` list into individual addresses.
///
/// Surrounding whitespace is trimmed. Empty entries and entries without a
/// port are rejected.
pub fn parse_addresses(list: &str) -> Result<Vec<String>, PoolError> {
    let mut addresses = Vec::new();
    for entry in list.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(PoolError::Config(format!(
                "empty address in list: {list:?}"
            )));
        }
        let valid_port = entry
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid_port {
            return Err(PoolError::Config(format!(
                "address must be host:port, got {entry:?}"
            )));
        }
        addresses.push(entry.to_string());
    }
    Ok(addresses)
}
