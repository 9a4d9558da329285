//! Protocol-level error types.

use thiserror::Error;

/// Errors that can occur during RESP parsing or reply coercion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Invalid RESP type marker.
    #[error("invalid reply type: {0:#x}")]
    InvalidType(u8),

    /// Length header is not a valid number or is out of range.
    #[error("invalid length: {0}")]
    InvalidLength(i64),

    /// Integer reply or length header could not be parsed.
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// A line or bulk payload was not terminated by CRLF.
    #[error("missing CRLF terminator")]
    MissingCrlf,

    /// Bulk string length exceeds maximum allowed.
    #[error("bulk string too large: {length} bytes (max {max})")]
    BulkTooLarge {
        /// Declared bulk length.
        length: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Nested arrays exceed the maximum supported depth.
    #[error("reply nesting too deep (max {max})")]
    NestingTooDeep {
        /// Maximum allowed nesting depth.
        max: usize,
    },

    /// Reply was of a different type than the caller expected.
    #[error("unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        /// Expected reply type.
        expected: &'static str,
        /// Actual reply type.
        actual: &'static str,
    },

    /// A key/value array had an odd number of elements.
    #[error("expected even number of values, got {0}")]
    OddPairs(usize),

    /// Reply text was not valid UTF-8.
    #[error("invalid UTF-8 in reply")]
    InvalidUtf8,
}
