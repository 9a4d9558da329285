//! Client configuration.

use std::time::Duration;

use redisbloom_auth::Credentials;
use redisbloom_pool::{PoolConfig, parse_addresses};

use crate::error::{Error, Result};

/// Default server address.
pub const DEFAULT_ADDRESS: &str = "localhost:6379";

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct Config {
    /// Server addresses, `host:port`. More than one enables random
    /// per-command host selection.
    pub addresses: Vec<String>,

    /// Label for this client. Carried for callers; sent nowhere.
    pub name: String,

    /// Credentials applied to every connection of every address.
    pub credentials: Option<Credentials>,

    /// Pool settings, applied per address.
    pub pool: PoolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addresses: vec![DEFAULT_ADDRESS.to_string()],
            name: String::new(),
            credentials: None,
            pool: PoolConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a comma-separated address list.
    ///
    /// ```rust,ignore
    /// let config = Config::from_addresses("10.0.0.1:6379, 10.0.0.2:6379")?;
    /// assert_eq!(config.addresses.len(), 2);
    /// ```
    pub fn from_addresses(list: &str) -> Result<Self> {
        Ok(Self {
            addresses: parse_addresses(list)?,
            ..Self::default()
        })
    }

    /// Set the client label.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Authenticate with a password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::password(password));
        self
    }

    /// Set the credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set the per-address connection ceiling.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.pool.max_connections = count;
        self
    }

    /// Set the bounded wait for a free connection slot.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.pool.connection_timeout = Some(timeout);
        self
    }

    /// Set the per-command reply timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.pool.command_timeout = Some(timeout);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(Error::Config("at least one address is required".into()));
        }
        self.pool.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.addresses, vec![DEFAULT_ADDRESS]);
        assert!(config.credentials.is_none());
        assert_eq!(config.pool.max_connections, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_addresses_splits_and_trims() {
        let config = Config::from_addresses("a:1, b:2").unwrap();
        assert_eq!(config.addresses, vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_from_addresses_rejects_empty_entry() {
        let err = Config::from_addresses("a:1,,b:2").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_chain() {
        let config = Config::new()
            .name("filters")
            .password("secret")
            .max_connections(8)
            .connection_timeout(Duration::from_millis(250));
        assert_eq!(config.name, "filters");
        assert!(config.credentials.is_some());
        assert_eq!(config.pool.max_connections, 8);
        assert_eq!(
            config.pool.connection_timeout,
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_validate_rejects_no_addresses() {
        let mut config = Config::new();
        config.addresses.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(Config::new().max_connections(0).validate().is_err());
    }
}
