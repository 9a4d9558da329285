//! Pool error types.

use std::time::Duration;

use redisbloom_auth::AuthError;
use redisbloom_codec::CodecError;
use resp_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while acquiring or using a pooled connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The address was unreachable or the connection dropped mid-command.
    #[error("connection to {address} failed: {source}")]
    Connection {
        /// Server address.
        address: String,
        /// Underlying transport failure.
        #[source]
        source: CodecError,
    },

    /// Every connection slot stayed in use for the whole bounded wait.
    #[error("pool exhausted: {max} connections in use, waited {waited:?}")]
    PoolExhausted {
        /// The pool's ceiling.
        max: u32,
        /// How long the caller waited.
        waited: Duration,
    },

    /// The server rejected the configured credentials.
    #[error("authentication to {address} failed: {source}")]
    Authentication {
        /// Server address.
        address: String,
        /// Rejection details.
        #[source]
        source: AuthError,
    },

    /// The server sent a malformed reply.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Connecting or waiting for a reply took too long.
    #[error("timed out after {timeout:?} waiting on {address}")]
    Timeout {
        /// Server address.
        address: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The pool has been closed.
    #[error("pool is closed")]
    PoolClosed,

    /// Invalid pool configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PoolError {
    /// Map a codec failure on a connection to `address`.
    pub(crate) fn from_codec(address: &str, err: CodecError) -> Self {
        match err {
            CodecError::Protocol(e) => Self::Protocol(e),
            other => Self::Connection {
                address: address.to_string(),
                source: other,
            },
        }
    }

    /// Check if this is a connection-level failure (unreachable, dropped, timed out).
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Check if the pool ceiling was reached and the wait timed out.
    #[must_use]
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }

    /// Check if the credentials were rejected.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Check if a later attempt could succeed without changing configuration.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::PoolExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_protocol_errors_surface_as_protocol() {
        let err = PoolError::from_codec(
            "a:1",
            CodecError::Protocol(ProtocolError::InvalidType(b'!')),
        );
        assert!(matches!(err, PoolError::Protocol(ProtocolError::InvalidType(b'!'))));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_codec_io_errors_surface_as_connection() {
        let err = PoolError::from_codec("a:1", CodecError::ConnectionClosed);
        assert!(err.is_connection_error());
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "connection to a:1 failed: connection closed");
    }

    #[test]
    fn test_classification() {
        let exhausted = PoolError::PoolExhausted {
            max: 2,
            waited: Duration::from_millis(50),
        };
        assert!(exhausted.is_pool_exhausted());
        assert!(exhausted.is_transient());

        let auth = PoolError::Authentication {
            address: "a:1".into(),
            source: AuthError::Rejected("WRONGPASS".into()),
        };
        assert!(auth.is_authentication_error());
        assert!(!auth.is_transient());
    }
}
