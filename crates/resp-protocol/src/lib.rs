//! # resp-protocol
//!
//! Pure implementation of the RESP2 request/reply protocol used by Redis and
//! Redis modules such as RedisBloom.
//!
//! This crate performs no I/O. It provides:
//!
//! - [`Command`]: a command name plus a flat argument list, encoded as a RESP
//!   array of bulk strings
//! - [`Value`]: the tagged reply model (status, error, integer, bulk, array, nil)
//! - [`decode()`]: an incremental decoder that never consumes partial replies
//! - [`FromValue`]: typed coercion from replies into Rust types
//!
//! ## Example
//!
//! ```
//! use bytes::BytesMut;
//! use resp_protocol::{Command, Value, decode};
//!
//! let mut out = BytesMut::new();
//! Command::new("BF.EXISTS").arg("filter").arg("item").encode(&mut out);
//!
//! let mut reply = BytesMut::from(&b":1\r\n"[..]);
//! let value = decode(&mut reply).unwrap().unwrap();
//! assert_eq!(value, Value::Integer(1));
//! assert!(value.convert::<bool>().unwrap());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod command;
pub mod decode;
pub mod error;
pub mod reply;
pub mod value;

pub use command::{Command, ToArg};
pub use decode::{MAX_BULK_LEN, MAX_DEPTH, decode};
pub use error::ProtocolError;
pub use reply::FromValue;
pub use value::Value;
