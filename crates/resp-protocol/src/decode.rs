//! Incremental RESP2 reply decoding.
//!
//! The decoder never consumes a partial reply: it scans the buffer first and
//! only advances once a complete value is available, so it can be driven
//! directly from a socket read buffer.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::value::Value;

/// Maximum bulk string length accepted (512 MiB, the server-side limit).
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth accepted.
pub const MAX_DEPTH: usize = 64;

/// Decode one reply from the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed; `buf` is untouched in that
/// case. On success the reply's bytes are removed from `buf`.
///
/// Each call rescans from the start of `buf`, so a large array arriving over
/// many reads is scanned once per read. Replies in this client are small
/// enough that this stays cheap.
// TODO: keep a resumable cursor in `RespCodec` if large `TOPK.LIST` replies
// show up in profiles.
pub fn decode(buf: &mut BytesMut) -> Result<Option<Value>, ProtocolError> {
    let mut cursor = Cursor { buf: &buf[..], pos: 0 };
    let value = cursor.value(0)?;
    let consumed = cursor.pos;
    if value.is_some() {
        buf.advance(consumed);
    }
    Ok(value)
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn value(&mut self, depth: usize) -> Result<Option<Value>, ProtocolError> {
        if depth > MAX_DEPTH {
            return Err(ProtocolError::NestingTooDeep { max: MAX_DEPTH });
        }
        let Some(&marker) = self.buf.get(self.pos) else {
            return Ok(None);
        };
        self.pos += 1;
        let Some(line) = self.line()? else {
            return Ok(None);
        };

        match marker {
            b'+' => Ok(Some(Value::Simple(utf8(line)?))),
            b'-' => Ok(Some(Value::Error(utf8(line)?))),
            b':' => Ok(Some(Value::Integer(parse_int(line)?))),
            b'$' => {
                let len = parse_int(line)?;
                if len == -1 {
                    return Ok(Some(Value::Nil));
                }
                let len = checked_len(len)?;
                if len > MAX_BULK_LEN {
                    return Err(ProtocolError::BulkTooLarge {
                        length: len,
                        max: MAX_BULK_LEN,
                    });
                }
                if self.buf.len() < self.pos + len + 2 {
                    return Ok(None);
                }
                let data = Bytes::copy_from_slice(&self.buf[self.pos..self.pos + len]);
                if &self.buf[self.pos + len..self.pos + len + 2] != b"\r\n" {
                    return Err(ProtocolError::MissingCrlf);
                }
                self.pos += len + 2;
                Ok(Some(Value::Bulk(data)))
            }
            b'*' => {
                let len = parse_int(line)?;
                if len == -1 {
                    return Ok(Some(Value::Nil));
                }
                let len = checked_len(len)?;
                // Cap the preallocation; the declared length is untrusted.
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    match self.value(depth + 1)? {
                        Some(item) => items.push(item),
                        None => return Ok(None),
                    }
                }
                Ok(Some(Value::Array(items)))
            }
            other => Err(ProtocolError::InvalidType(other)),
        }
    }

    /// Read up to the next CRLF, returning the line without its terminator.
    fn line(&mut self) -> Result<Option<&'a [u8]>, ProtocolError> {
        let buf: &'a [u8] = self.buf;
        let rest = &buf[self.pos..];
        let Some(nl) = rest.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        if nl == 0 || rest[nl - 1] != b'\r' {
            return Err(ProtocolError::MissingCrlf);
        }
        let start = self.pos;
        self.pos += nl + 1;
        Ok(Some(&buf[start..start + nl - 1]))
    }
}

fn checked_len(len: i64) -> Result<usize, ProtocolError> {
    usize::try_from(len).map_err(|_| ProtocolError::InvalidLength(len))
}

fn utf8(line: &[u8]) -> Result<String, ProtocolError> {
    std::str::from_utf8(line)
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8)
}

fn parse_int(line: &[u8]) -> Result<i64, ProtocolError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ProtocolError::InvalidInteger(String::from_utf8_lossy(line).into_owned()))
}
