//! Multi-address connection pool with random host selection.

use std::sync::Arc;

use rand::Rng;
use redisbloom_auth::Credentials;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::host::{PooledConnection, SingleHostPool};
use crate::pool::{PoolMetrics, PoolStatus};

/// A pool spreading load over several independent servers.
///
/// Holds one [`SingleHostPool`] per address. Every [`get`](Self::get) picks
/// a sub-pool uniformly at random, with no affinity between successive calls
/// and no awareness of host health. If the chosen sub-pool fails, the error
/// is returned as-is; there is no fallback to another address.
///
/// The set of sub-pools is fixed at construction.
#[derive(Clone)]
pub struct MultiHostPool {
    pools: Arc<[SingleHostPool]>,
}

impl MultiHostPool {
    /// Create one sub-pool per address, each with its own copy of `config`.
    pub fn new<I, S>(
        addresses: I,
        credentials: Option<Credentials>,
        config: PoolConfig,
    ) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pools = addresses
            .into_iter()
            .map(|address| SingleHostPool::new(address, credentials.clone(), config.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        if pools.is_empty() {
            return Err(PoolError::Config(
                "multi-host pool needs at least one address".into(),
            ));
        }
        Ok(Self {
            pools: pools.into(),
        })
    }

    /// Get a connection from a randomly chosen sub-pool.
    pub async fn get(&self) -> Result<PooledConnection, PoolError> {
        let pool = &self.pools[self.pick()];
        tracing::trace!(address = pool.address(), "selected host");
        pool.get().await
    }

    fn pick(&self) -> usize {
        rand::thread_rng().gen_range(0..self.pools.len())
    }

    /// Return a connection to the sub-pool that issued it.
    ///
    /// The guard carries a back-reference to its issuing sub-pool, so the
    /// connection can never land in another one.
    pub fn release(&self, conn: PooledConnection) {
        debug_assert!(self.pools.iter().any(|p| p.owns(&conn)));
        conn.release();
    }

    /// The sub-pools, in address order.
    #[must_use]
    pub fn pools(&self) -> &[SingleHostPool] {
        &self.pools
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Always `false`; construction rejects an empty address list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Status summed over all sub-pools.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        self.pools
            .iter()
            .map(SingleHostPool::status)
            .fold(PoolStatus::default(), PoolStatus::merge)
    }

    /// Metrics summed over all sub-pools.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        self.pools
            .iter()
            .map(SingleHostPool::metrics)
            .fold(PoolMetrics::default(), PoolMetrics::merge)
    }

    /// Close every sub-pool.
    pub fn close(&self) {
        for pool in self.pools.iter() {
            pool.close();
        }
    }

    /// Check if every sub-pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pools.iter().all(SingleHostPool::is_closed)
    }
}

impl std::fmt::Debug for MultiHostPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiHostPool")
            .field("pools", &self.pools)
            .finish()
    }
}
