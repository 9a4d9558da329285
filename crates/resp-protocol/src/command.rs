//! Command request encoding.
//!
//! Every request is a RESP array of bulk strings: the command name followed
//! by a flat argument list.

use bytes::{BufMut, Bytes, BytesMut};

/// Conversion of a Rust value into one command argument.
pub trait ToArg {
    /// Convert into the raw argument bytes.
    fn to_arg(&self) -> Bytes;
}

impl ToArg for str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Bytes {
        (**self).to_arg()
    }
}

macro_rules! int_to_arg {
    ($($ty:ty),*) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )*
    };
}

int_to_arg!(i32, i64, u32, u64, usize);

impl ToArg for f64 {
    /// Shortest decimal form that round-trips to the same `f64`.
    fn to_arg(&self) -> Bytes {
        Bytes::from(format!("{self}"))
    }
}

/// A command ready to be sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    args: Vec<Bytes>,
}

impl Command {
    /// Create a new command with no arguments.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg<A: ToArg + ?Sized>(mut self, arg: &A) -> Self {
        self.args.push(arg.to_arg());
        self
    }

    /// Append every argument from an iterator, flattened.
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.args.extend(args.into_iter().map(|a| a.to_arg()));
        self
    }

    /// Get the command name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the encoded arguments, excluding the name.
    #[must_use]
    pub fn arg_list(&self) -> &[Bytes] {
        &self.args
    }

    /// Encode the command as a RESP array of bulk strings.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(16 + self.name.len() + self.args.iter().map(|a| a.len() + 16).sum::<usize>());
        dst.put_u8(b'*');
        dst.put_slice((self.args.len() + 1).to_string().as_bytes());
        dst.put_slice(b"\r\n");
        put_bulk(dst, self.name.as_bytes());
        for arg in &self.args {
            put_bulk(dst, arg);
        }
    }
}

fn put_bulk(dst: &mut BytesMut, data: &[u8]) {
    dst.put_u8(b'$');
    dst.put_slice(data.len().to_string().as_bytes());
    dst.put_slice(b"\r\n");
    dst.put_slice(data);
    dst.put_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_command() {
        let cmd = Command::new("BF.ADD").arg("filter").arg("item");
        let mut buf = BytesMut::new();
        cmd.encode(&mut buf);
        assert_eq!(
            &buf[..],
            b"*3\r\n$6\r\nBF.ADD\r\n$6\r\nfilter\r\n$4\r\nitem\r\n"
        );
    }

    #[test]
    fn test_flat_args() {
        let items = ["a", "b", "c"];
        let cmd = Command::new("BF.MADD").arg("f").args(items);
        assert_eq!(cmd.name(), "BF.MADD");
        assert_eq!(cmd.arg_list().len(), 4);
        assert_eq!(cmd.arg_list()[3], Bytes::from_static(b"c"));
    }

    #[test]
    fn test_numeric_args() {
        let cmd = Command::new("BF.RESERVE")
            .arg("f")
            .arg(&0.01f64)
            .arg(&1000u64)
            .arg(&-3i64);
        assert_eq!(cmd.arg_list()[1], Bytes::from_static(b"0.01"));
        assert_eq!(cmd.arg_list()[2], Bytes::from_static(b"1000"));
        assert_eq!(cmd.arg_list()[3], Bytes::from_static(b"-3"));
    }

    #[test]
    fn test_empty_command() {
        let mut buf = BytesMut::new();
        Command::new("PING").encode(&mut buf);
        assert_eq!(&buf[..], b"*1\r\n$4\r\nPING\r\n");
    }
}
