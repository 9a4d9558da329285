//! RESP2 reply values.

use bytes::{BufMut, Bytes, BytesMut};

/// A single RESP2 reply.
///
/// Replies are decoded into this tagged representation once, so callers
/// match on variants instead of inspecting raw type markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `+OK` style status reply.
    Simple(String),
    /// `-ERR ...` error reply.
    Error(String),
    /// `:123` integer reply.
    Integer(i64),
    /// `$n` bulk string.
    Bulk(Bytes),
    /// `*n` array of nested replies.
    Array(Vec<Value>),
    /// Null bulk string (`$-1`) or null array (`*-1`).
    Nil,
}

impl Value {
    /// Build a bulk string reply from anything byte-like.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::Bulk(data.into())
    }

    /// Build a status reply.
    pub fn simple(text: impl Into<String>) -> Self {
        Value::Simple(text.into())
    }

    /// Build an error reply.
    pub fn error(text: impl Into<String>) -> Self {
        Value::Error(text.into())
    }

    /// Shorthand for the `+OK` status reply.
    #[must_use]
    pub fn ok() -> Self {
        Value::Simple("OK".to_string())
    }

    /// Name of the reply type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Simple(_) => "simple string",
            Value::Error(_) => "error",
            Value::Integer(_) => "integer",
            Value::Bulk(_) => "bulk string",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
    }

    /// Check if this is an error reply.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Encode the value in RESP2 wire form.
    ///
    /// Clients never send replies; this is used by servers and test doubles.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Value::Simple(text) => {
                dst.put_u8(b'+');
                dst.put_slice(text.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Value::Error(text) => {
                dst.put_u8(b'-');
                dst.put_slice(text.as_bytes());
                dst.put_slice(b"\r\n");
            }
            Value::Integer(n) => {
                dst.put_u8(b':');
                dst.put_slice(n.to_string().as_bytes());
                dst.put_slice(b"\r\n");
            }
            Value::Bulk(data) => {
                dst.put_u8(b'$');
                dst.put_slice(data.len().to_string().as_bytes());
                dst.put_slice(b"\r\n");
                dst.put_slice(data);
                dst.put_slice(b"\r\n");
            }
            Value::Array(items) => {
                dst.put_u8(b'*');
                dst.put_slice(items.len().to_string().as_bytes());
                dst.put_slice(b"\r\n");
                for item in items {
                    item.encode(dst);
                }
            }
            Value::Nil => dst.put_slice(b"$-1\r\n"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bulk(Bytes::from(s))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
