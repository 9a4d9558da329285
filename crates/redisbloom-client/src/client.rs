//! Client implementation.

use redisbloom_auth::Credentials;
use redisbloom_pool::Pool;
use resp_protocol::{Command, FromValue, Value};

use crate::config::Config;
use crate::error::{Error, Result};

/// A RedisBloom client backed by a connection pool.
///
/// Every command borrows one pooled connection for exactly one request and
/// returns it afterwards, on success, on error, and when the calling future
/// is dropped. With several addresses configured, each command goes to a
/// randomly chosen one.
///
/// Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct Client {
    pool: Pool,
    name: String,
}

impl Client {
    /// Create a client from a comma-separated address list.
    ///
    /// ```rust,ignore
    /// let client = Client::new("10.0.0.1:6379,10.0.0.2:6379", "filters", None)?;
    /// ```
    ///
    /// No connection is opened until the first command.
    pub fn new(addr: &str, name: impl Into<String>, credentials: Option<Credentials>) -> Result<Self> {
        let mut config = Config::from_addresses(addr)?.name(name);
        config.credentials = credentials;
        Self::with_config(config)
    }

    /// Create a client from a full configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = Pool::new(config.addresses, config.credentials, config.pool)?;
        tracing::debug!(name = %config.name, addresses = ?pool.addresses(), "client created");
        Ok(Self {
            pool,
            name: config.name,
        })
    }

    /// Create a client over an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool, name: impl Into<String>) -> Self {
        Self {
            pool,
            name: name.into(),
        }
    }

    /// Send a raw command and return its reply.
    ///
    /// Server error replies are returned as [`Error::Server`].
    pub async fn execute(&self, command: Command) -> Result<Value> {
        tracing::debug!(client = %self.name, command = command.name(), "dispatching command");

        let mut conn = self.pool.get().await?;
        let reply = conn.execute(&command).await;
        self.pool.release(conn);

        match reply? {
            Value::Error(message) => Err(Error::Server(message)),
            value => Ok(value),
        }
    }

    /// Send a command and convert its reply.
    pub(crate) async fn query<T: FromValue>(&self, command: Command) -> Result<T> {
        Ok(T::from_value(self.execute(command).await?)?)
    }

    /// The client label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Close the pool. Later commands fail with a pool-closed error.
    pub fn close(&self) {
        self.pool.close();
    }
}
