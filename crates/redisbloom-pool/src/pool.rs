//! Pool facade over single- and multi-address pools.

use std::time::Duration;

use redisbloom_auth::Credentials;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::host::{PooledConnection, SingleHostPool};
use crate::multi::MultiHostPool;

/// A connection pool for one or more server addresses.
///
/// [`Pool::new`] builds a [`SingleHostPool`] for one address and a
/// [`MultiHostPool`] for several. Both variants share the same checkout and
/// release surface, so callers rarely need to match on the variant.
#[derive(Debug, Clone)]
pub enum Pool {
    /// One address.
    Single(SingleHostPool),
    /// Several addresses with random selection per checkout.
    Multi(MultiHostPool),
}

impl Pool {
    /// Create a new pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Create a pool over `addresses`.
    ///
    /// Fails with [`PoolError::Config`] when `addresses` is empty or `config`
    /// is invalid. No connection is opened here.
    pub fn new(
        addresses: Vec<String>,
        credentials: Option<Credentials>,
        config: PoolConfig,
    ) -> Result<Self, PoolError> {
        match addresses.len() {
            0 => Err(PoolError::Config("at least one address is required".into())),
            1 => {
                let address = addresses.into_iter().next().unwrap_or_default();
                SingleHostPool::new(address, credentials, config).map(Self::Single)
            }
            _ => MultiHostPool::new(addresses, credentials, config).map(Self::Multi),
        }
    }

    /// Get a connection, waiting up to `connection_timeout` for a free slot.
    pub async fn get(&self) -> Result<PooledConnection, PoolError> {
        match self {
            Self::Single(pool) => pool.get().await,
            Self::Multi(pool) => pool.get().await,
        }
    }

    /// Return a connection to the sub-pool that issued it.
    pub fn release(&self, conn: PooledConnection) {
        match self {
            Self::Single(pool) => pool.release(conn),
            Self::Multi(pool) => pool.release(conn),
        }
    }

    /// Get the current pool status, summed over all addresses.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        match self {
            Self::Single(pool) => pool.status(),
            Self::Multi(pool) => pool.status(),
        }
    }

    /// Get pool metrics, summed over all addresses.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        match self {
            Self::Single(pool) => pool.metrics(),
            Self::Multi(pool) => pool.metrics(),
        }
    }

    /// Close the pool.
    pub fn close(&self) {
        match self {
            Self::Single(pool) => pool.close(),
            Self::Multi(pool) => pool.close(),
        }
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Single(pool) => pool.is_closed(),
            Self::Multi(pool) => pool.is_closed(),
        }
    }

    /// Addresses served by this pool, in configuration order.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        match self {
            Self::Single(pool) => vec![pool.address()],
            Self::Multi(pool) => pool.pools().iter().map(SingleHostPool::address).collect(),
        }
    }
}

/// Builder for creating a connection pool.
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .address("10.0.0.1:6379")
///     .address("10.0.0.2:6379")
///     .max_connections(50)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct PoolBuilder {
    addresses: Vec<String>,
    credentials: Option<Credentials>,
    pool_config: PoolConfig,
}

impl PoolBuilder {
    /// Create a new pool builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one server address.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    /// Add several server addresses.
    #[must_use]
    pub fn addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Authenticate every new connection with these credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the maximum number of in-use connections per address.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.pool_config.max_connections = count;
        self
    }

    /// Set the bounded wait for a free connection slot.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.connection_timeout = Some(timeout);
        self
    }

    /// Set the TCP connect timeout for new connections.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.connect_timeout = timeout;
        self
    }

    /// Set the per-command reply timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.command_timeout = Some(timeout);
        self
    }

    /// Set the idle time after which a connection is health-checked on borrow.
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.pool_config.health_check_interval = interval;
        self
    }

    /// Build the pool.
    pub fn build(self) -> Result<Pool, PoolError> {
        Pool::new(self.addresses, self.credentials, self.pool_config)
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of idle connections available.
    pub available: u32,
    /// Number of connections currently in use.
    pub in_use: u32,
    /// Total number of open connections.
    pub total: u32,
    /// Maximum allowed in-use connections.
    pub max: u32,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.in_use as f64 / self.max as f64) * 100.0
    }

    /// Check if every connection slot is in use.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.in_use >= self.max
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            available: self.available + other.available,
            in_use: self.in_use + other.in_use,
            total: self.total + other.total,
            max: self.max + other.max,
        }
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone, Default)]
pub struct PoolMetrics {
    /// Total connections created since pool start.
    pub connections_created: u64,
    /// Total connections closed since pool start.
    pub connections_closed: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed connection checkouts (timeouts, connect failures, pool closed).
    pub checkouts_failed: u64,
    /// Health checks performed.
    pub health_checks_performed: u64,
    /// Health checks that failed.
    pub health_checks_failed: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }

    /// Calculate health check success rate (0.0 to 1.0).
    #[must_use]
    pub fn health_check_success_rate(&self) -> f64 {
        if self.health_checks_performed == 0 {
            return 1.0;
        }
        let successful = self.health_checks_performed - self.health_checks_failed;
        successful as f64 / self.health_checks_performed as f64
    }

    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            connections_created: self.connections_created + other.connections_created,
            connections_closed: self.connections_closed + other.connections_closed,
            checkouts_successful: self.checkouts_successful + other.checkouts_successful,
            checkouts_failed: self.checkouts_failed + other.checkouts_failed,
            health_checks_performed: self.health_checks_performed
                + other.health_checks_performed,
            health_checks_failed: self.health_checks_failed + other.health_checks_failed,
            uptime: self.uptime.max(other.uptime),
        }
    }
}
