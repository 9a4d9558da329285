//! tokio-util codec for RESP2.

use bytes::BytesMut;
use resp_protocol::{Command, Value};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Default cap on buffered, not-yet-decoded reply bytes (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// RESP2 codec.
///
/// Decodes replies into [`Value`] and encodes [`Command`] requests. Servers
/// and test doubles can also encode [`Value`] replies through the same codec.
#[derive(Debug, Clone)]
pub struct RespCodec {
    max_frame_size: usize,
}

impl RespCodec {
    /// Create a codec with the default frame size limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the maximum number of buffered bytes for a single reply.
    #[must_use]
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }

    /// Get the configured frame size limit.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for RespCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RespCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>, CodecError> {
        match resp_protocol::decode(src)? {
            Some(value) => Ok(Some(value)),
            None if src.len() > self.max_frame_size => Err(CodecError::FrameTooLarge {
                size: src.len(),
                max: self.max_frame_size,
            }),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Value>, CodecError> {
        match self.decode(src)? {
            Some(value) => Ok(Some(value)),
            None if src.is_empty() => Ok(None),
            None => {
                tracing::trace!(remaining = src.len(), "stream closed mid-reply");
                Err(CodecError::ConnectionClosed)
            }
        }
    }
}

impl Encoder<Command> for RespCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), CodecError> {
        item.encode(dst);
        Ok(())
    }
}

impl Encoder<&Command> for RespCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Command, dst: &mut BytesMut) -> Result<(), CodecError> {
        item.encode(dst);
        Ok(())
    }
}

impl Encoder<Value> for RespCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<(), CodecError> {
        item.encode(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_waits_for_complete_reply() {
        let mut codec = RespCodec::new();
        let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"lo\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Value::from("hello")));
    }

    #[test]
    fn test_frame_limit() {
        let mut codec = RespCodec::new().with_max_frame_size(8);
        let mut buf = BytesMut::from(&b"$100\r\n0123456789"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::FrameTooLarge { max: 8, .. })
        ));
    }

    #[test]
    fn test_eof_mid_reply() {
        let mut codec = RespCodec::new();
        let mut buf = BytesMut::from(&b"*2\r\n:1\r\n"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(CodecError::ConnectionClosed)
        ));
        let mut empty = BytesMut::new();
        assert!(codec.decode_eof(&mut empty).unwrap().is_none());
    }

    #[test]
    fn test_encode_command() {
        let mut codec = RespCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Command::new("PING"), &mut buf).unwrap();
        assert_eq!(&buf[..], b"*1\r\n$4\r\nPING\r\n");
    }
}
