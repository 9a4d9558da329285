//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while authenticating a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server rejected the credentials.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// The server answered AUTH with something other than a status reply.
    #[error("unexpected AUTH reply: {0}")]
    UnexpectedReply(&'static str),
}
