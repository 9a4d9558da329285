//! Codec error types.

use thiserror::Error;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO error during read/write operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol-level error from resp-protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] resp_protocol::ProtocolError),

    /// Buffered reply data exceeds the configured maximum.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Bytes currently buffered.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,
}

impl CodecError {
    /// Check if this error came from the transport rather than the payload.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }
}
