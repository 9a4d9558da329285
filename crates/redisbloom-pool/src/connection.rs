//! A single server connection.

use std::sync::Arc;
use std::time::Duration;

use redisbloom_auth::{Credentials, verify_auth_reply};
use redisbloom_codec::{CodecError, RespStream};
use resp_protocol::{Command, Value};
use tokio::net::TcpStream;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::lifecycle::{ConnectionMetadata, ConnectionState};

/// One network session to one server address.
///
/// A connection runs one command at a time; `&mut self` on [`execute`]
/// enforces a single caller. Any transport failure, reply timeout or framing
/// error marks it [`ConnectionState::Closed`], and the owning pool discards
/// it instead of recycling it.
///
/// [`execute`]: Connection::execute
pub struct Connection {
    stream: RespStream<TcpStream>,
    metadata: ConnectionMetadata,
    state: ConnectionState,
    command_timeout: Option<Duration>,
}

impl Connection {
    /// Open a connection and authenticate it if credentials are given.
    pub(crate) async fn connect(
        id: u64,
        address: Arc<str>,
        credentials: Option<&Credentials>,
        config: &PoolConfig,
    ) -> Result<Self, PoolError> {
        tracing::debug!(address = %address, connection_id = id, "opening connection");

        let handshake = async {
            let tcp = TcpStream::connect(&*address)
                .await
                .map_err(|e| PoolError::from_codec(&address, CodecError::Io(e)))?;
            tcp.set_nodelay(true)
                .map_err(|e| PoolError::from_codec(&address, CodecError::Io(e)))?;

            let mut stream = RespStream::new(tcp);
            if let Some(credentials) = credentials {
                let reply = stream
                    .request(&credentials.auth_command())
                    .await
                    .map_err(|e| PoolError::from_codec(&address, e))?;
                verify_auth_reply(&reply).map_err(|source| PoolError::Authentication {
                    address: address.to_string(),
                    source,
                })?;
            }
            Ok::<_, PoolError>(stream)
        };

        let stream = tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .map_err(|_| PoolError::Timeout {
                address: address.to_string(),
                timeout: config.connect_timeout,
            })??;

        Ok(Self {
            stream,
            metadata: ConnectionMetadata::new(id, address),
            state: ConnectionState::InUse,
            command_timeout: config.command_timeout,
        })
    }

    /// Send one command and return its reply.
    ///
    /// Server error replies come back as `Ok(Value::Error(..))` and leave the
    /// connection usable.
    pub async fn execute(&mut self, command: &Command) -> Result<Value, PoolError> {
        if self.state == ConnectionState::Closed {
            return Err(PoolError::from_codec(
                &self.metadata.address,
                CodecError::ConnectionClosed,
            ));
        }

        // Stays Closed if this future is dropped before the reply arrives,
        // since the stream would then hold an unread reply.
        self.state = ConnectionState::Closed;

        let result = match self.command_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.stream.request(command)).await
            {
                Ok(reply) => reply.map_err(|e| PoolError::from_codec(&self.metadata.address, e)),
                Err(_) => Err(PoolError::Timeout {
                    address: self.metadata.address.to_string(),
                    timeout,
                }),
            },
            None => self
                .stream
                .request(command)
                .await
                .map_err(|e| PoolError::from_codec(&self.metadata.address, e)),
        };

        match &result {
            Ok(_) => {
                self.state = ConnectionState::InUse;
                self.metadata.touch();
            }
            Err(e) => {
                tracing::debug!(
                    address = %self.metadata.address,
                    connection_id = self.metadata.id,
                    command = command.name(),
                    error = %e,
                    "connection marked unusable"
                );
            }
        }
        result
    }

    /// Check the connection with `PING`.
    pub async fn ping(&mut self) -> Result<(), PoolError> {
        match self.execute(&Command::new("PING")).await? {
            Value::Simple(_) | Value::Bulk(_) => Ok(()),
            Value::Error(message) => {
                // Reachable but refusing commands (e.g. lost AUTH): not reusable.
                self.state = ConnectionState::Closed;
                Err(PoolError::from_codec(
                    &self.metadata.address,
                    CodecError::Io(std::io::Error::other(message)),
                ))
            }
            other => Err(PoolError::Protocol(
                resp_protocol::ProtocolError::UnexpectedReply {
                    expected: "PONG",
                    actual: other.type_name(),
                },
            )),
        }
    }

    /// Get the connection metadata.
    #[must_use]
    pub fn metadata(&self) -> &ConnectionMetadata {
        &self.metadata
    }

    /// Get the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the connection failed and must not be reused.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Server address this connection talks to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.metadata.address
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        if self.state != ConnectionState::Closed {
            self.state = state;
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.metadata.id)
            .field("address", &self.metadata.address)
            .field("state", &self.state)
            .finish()
    }
}
