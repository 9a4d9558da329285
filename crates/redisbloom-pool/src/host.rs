//! Single-address connection pool.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use redisbloom_auth::Credentials;
use resp_protocol::{Command, Value};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;
use crate::connection::Connection;
use crate::error::PoolError;
use crate::lifecycle::{ConnectionMetadata, ConnectionState};
use crate::pool::{PoolMetrics, PoolStatus};

/// A bounded pool of connections to one server address.
///
/// At most `max_connections` connections are checked out at once; further
/// callers of [`get`](SingleHostPool::get) wait up to the configured
/// `connection_timeout` for a release. Idle connections are reused
/// most-recently-returned first, and a new connection is opened only when no
/// idle one is available.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct SingleHostPool {
    inner: Arc<HostInner>,
}

pub(crate) struct HostInner {
    address: Arc<str>,
    credentials: Option<Credentials>,
    config: PoolConfig,

    /// One permit per allowed in-use connection.
    permits: Arc<Semaphore>,

    /// Connections ready for reuse.
    idle: Mutex<VecDeque<Connection>>,

    closed: AtomicBool,
    next_connection_id: AtomicU64,

    /// Connections currently checked out.
    in_use: AtomicU32,

    /// Connections currently open (idle + in use).
    open: AtomicU32,

    created_at: Instant,
    metrics: Mutex<PoolMetricsInner>,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    connections_created: u64,
    connections_closed: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
    health_checks_performed: u64,
    health_checks_failed: u64,
}

impl SingleHostPool {
    /// Create a pool for `address`.
    ///
    /// No connection is opened until the first [`get`](Self::get).
    pub fn new(
        address: impl Into<String>,
        credentials: Option<Credentials>,
        config: PoolConfig,
    ) -> Result<Self, PoolError> {
        config.validate()?;
        let address: Arc<str> = Arc::from(address.into());

        tracing::info!(
            address = %address,
            max = config.max_connections,
            "connection pool created"
        );

        Ok(Self {
            inner: Arc::new(HostInner {
                address,
                credentials,
                permits: Arc::new(Semaphore::new(config.max_connections as usize)),
                idle: Mutex::new(VecDeque::new()),
                closed: AtomicBool::new(false),
                next_connection_id: AtomicU64::new(1),
                in_use: AtomicU32::new(0),
                open: AtomicU32::new(0),
                created_at: Instant::now(),
                metrics: Mutex::new(PoolMetricsInner::default()),
                config,
            }),
        })
    }

    /// Get a connection from the pool.
    ///
    /// Returns an idle connection if one is available, otherwise opens a new
    /// one. When the ceiling is reached this waits for a release, failing
    /// with [`PoolError::PoolExhausted`] once `connection_timeout` elapses.
    /// Connect and authentication failures are returned as-is and free the
    /// reserved slot immediately.
    pub async fn get(&self) -> Result<PooledConnection, PoolError> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(PoolError::PoolClosed);
        }

        tracing::trace!(address = %inner.address, "acquiring connection from pool");

        let permit = match self.acquire_permit().await {
            Ok(permit) => permit,
            Err(e) => {
                inner.metrics.lock().checkouts_failed += 1;
                return Err(e);
            }
        };

        while let Some(conn) = inner.pop_idle() {
            let id = conn.metadata().id;
            let stale = conn
                .metadata()
                .needs_health_check(inner.config.health_check_interval);
            let mut pending = PendingIdle {
                pool: inner,
                conn: Some(conn),
            };
            if stale {
                inner.metrics.lock().health_checks_performed += 1;
                if let Err(e) = pending.ping().await {
                    tracing::warn!(
                        address = %inner.address,
                        connection_id = id,
                        error = %e,
                        "idle connection failed health check"
                    );
                    inner.metrics.lock().health_checks_failed += 1;
                    continue;
                }
            }
            if let Some(conn) = pending.take() {
                return Ok(inner.checkout(conn, permit));
            }
        }

        let id = inner.next_connection_id.fetch_add(1, Ordering::Relaxed);
        match Connection::connect(
            id,
            inner.address.clone(),
            inner.credentials.as_ref(),
            &inner.config,
        )
        .await
        {
            Ok(conn) => {
                inner.open.fetch_add(1, Ordering::AcqRel);
                inner.metrics.lock().connections_created += 1;
                Ok(inner.checkout(conn, permit))
            }
            Err(e) => {
                inner.metrics.lock().checkouts_failed += 1;
                Err(e)
            }
        }
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        let acquire = self.inner.permits.clone().acquire_owned();
        let permit = match self.inner.config.connection_timeout {
            Some(wait) => tokio::time::timeout(wait, acquire).await.map_err(|_| {
                tracing::debug!(address = %self.inner.address, waited = ?wait, "pool exhausted");
                PoolError::PoolExhausted {
                    max: self.inner.config.max_connections,
                    waited: wait,
                }
            })?,
            None => acquire.await,
        };
        // The semaphore is only closed by `close()`.
        permit.map_err(|_| PoolError::PoolClosed)
    }

    /// Return a connection to the pool.
    ///
    /// Equivalent to dropping the guard; broken connections are discarded.
    pub fn release(&self, conn: PooledConnection) {
        conn.release();
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let inner = &self.inner;
        PoolStatus {
            available: inner.idle.lock().len() as u32,
            in_use: inner.in_use.load(Ordering::Acquire),
            total: inner.open.load(Ordering::Acquire),
            max: inner.config.max_connections,
        }
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let m = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: m.connections_created,
            connections_closed: m.connections_closed,
            checkouts_successful: m.checkouts_successful,
            checkouts_failed: m.checkouts_failed,
            health_checks_performed: m.health_checks_performed,
            health_checks_failed: m.health_checks_failed,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Close the pool, dropping all idle connections.
    ///
    /// Checked-out connections are discarded when they come back, and
    /// waiting callers fail with [`PoolError::PoolClosed`].
    pub fn close(&self) {
        let inner = &self.inner;
        let drained: Vec<Connection> = {
            // `return_connection` reads the flag under this same lock.
            let mut idle = inner.idle.lock();
            if inner.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            idle.drain(..).collect()
        };
        inner.permits.close();
        for conn in drained {
            inner.discard(conn);
        }
        tracing::info!(address = %inner.address, "connection pool closed");
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Server address served by this pool.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Check whether `conn` was issued by this pool.
    #[must_use]
    pub fn owns(&self, conn: &PooledConnection) -> bool {
        Arc::ptr_eq(&self.inner, &conn.pool)
    }
}

impl std::fmt::Debug for SingleHostPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleHostPool")
            .field("address", &self.inner.address)
            .field("status", &self.status())
            .finish()
    }
}

impl HostInner {
    fn pop_idle(&self) -> Option<Connection> {
        self.idle.lock().pop_back()
    }

    fn checkout(self: &Arc<Self>, mut conn: Connection, permit: OwnedSemaphorePermit) -> PooledConnection {
        conn.set_state(ConnectionState::InUse);
        self.in_use.fetch_add(1, Ordering::AcqRel);
        self.metrics.lock().checkouts_successful += 1;
        tracing::trace!(
            address = %self.address,
            connection_id = conn.metadata().id,
            "connection checked out"
        );
        PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
            _permit: permit,
        }
    }

    fn return_connection(&self, mut conn: Connection) {
        self.in_use.fetch_sub(1, Ordering::AcqRel);

        if conn.is_broken() {
            self.discard(conn);
            return;
        }

        conn.set_state(ConnectionState::Idle);
        let mut idle = self.idle.lock();
        if self.closed.load(Ordering::Acquire)
            || idle.len() >= self.config.max_connections as usize
        {
            drop(idle);
            self.discard(conn);
            return;
        }
        tracing::trace!(
            address = %self.address,
            connection_id = conn.metadata().id,
            "returning connection to pool"
        );
        idle.push_back(conn);
    }

    fn discard(&self, conn: Connection) {
        self.open.fetch_sub(1, Ordering::AcqRel);
        self.metrics.lock().connections_closed += 1;
        tracing::debug!(
            address = %self.address,
            connection_id = conn.metadata().id,
            "discarding connection"
        );
    }
}

/// An idle connection taken out for a health check. Dropping it, including
/// when `get` is cancelled mid-check, discards the connection.
struct PendingIdle<'a> {
    pool: &'a HostInner,
    conn: Option<Connection>,
}

impl PendingIdle<'_> {
    async fn ping(&mut self) -> Result<(), PoolError> {
        match self.conn.as_mut() {
            Some(conn) => conn.ping().await,
            None => Ok(()),
        }
    }

    fn take(&mut self) -> Option<Connection> {
        self.conn.take()
    }
}

impl Drop for PendingIdle<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.discard(conn);
        }
    }
}

/// A connection checked out from a [`SingleHostPool`].
///
/// Dropping the guard returns the connection to the pool that issued it (or
/// discards it if it broke), on every exit path including errors and
/// cancelled futures. The ceiling slot is released at the same time.
pub struct PooledConnection {
    // Only taken by `Drop` and `detach`, both of which consume the guard.
    conn: Option<Connection>,
    pool: Arc<HostInner>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    #[allow(clippy::expect_used)]
    fn conn(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }

    #[allow(clippy::expect_used)]
    fn conn_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }

    /// Send one command on this connection and return its reply.
    pub async fn execute(&mut self, command: &Command) -> Result<Value, PoolError> {
        self.conn_mut().execute(command).await
    }

    /// Get the connection metadata.
    #[must_use]
    pub fn metadata(&self) -> &ConnectionMetadata {
        self.conn().metadata()
    }

    /// Check if the connection failed and will be discarded on release.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.conn().is_broken()
    }

    /// Address of the pool that issued this connection.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.pool.address
    }

    /// Return the connection to its pool now.
    pub fn release(self) {
        drop(self);
    }

    /// Detach the connection from the pool.
    ///
    /// The pool stops tracking it and its ceiling slot is freed; the caller
    /// owns the returned connection outright.
    #[allow(clippy::expect_used)]
    pub fn detach(mut self) -> Connection {
        let conn = self.conn.take().expect("connection present until drop");
        self.pool.in_use.fetch_sub(1, Ordering::AcqRel);
        self.pool.open.fetch_sub(1, Ordering::AcqRel);
        conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        // `_permit` drops after this body, so the connection is back in the
        // idle set before a waiter can claim the freed slot.
        if let Some(conn) = self.conn.take() {
            self.pool.return_connection(conn);
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("address", &self.pool.address)
            .field("connection", &self.conn)
            .finish()
    }
}
