//! Client error types.

use redisbloom_pool::PoolError;
use resp_protocol::ProtocolError;
use thiserror::Error;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Acquiring or using a pooled connection failed.
    #[error(transparent)]
    Pool(PoolError),

    /// The server answered with an error reply.
    #[error("server error: {0}")]
    Server(String),

    /// The reply did not have the shape the command expects.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<PoolError> for Error {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Config(message) => Self::Config(message),
            PoolError::Protocol(e) => Self::Protocol(e),
            other => Self::Pool(other),
        }
    }
}

impl Error {
    /// Check if the server was unreachable or the connection dropped.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Pool(e) if e.is_connection_error())
    }

    /// Check if no connection slot freed up within the bounded wait.
    #[must_use]
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, Self::Pool(e) if e.is_pool_exhausted())
    }

    /// Check if the server rejected the configured credentials.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Pool(e) if e.is_authentication_error())
    }

    /// Check if the server answered with an error reply.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
