//! # redisbloom-codec
//!
//! Async framing layer for RESP2 traffic.
//!
//! This crate turns a raw byte stream into decoded [`Value`] replies and
//! writes [`Command`] requests, handling replies split across TCP segment
//! boundaries.
//!
//! ## Features
//!
//! - Reply reassembly across TCP segments
//! - Bounded read buffer (oversized replies fail instead of growing forever)
//! - Integration with tokio-util's codec framework
//! - Request/reply helper for one-command-at-a-time connections
//!
//! [`Value`]: resp_protocol::Value
//! [`Command`]: resp_protocol::Command

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod framed;
pub mod resp_codec;

pub use error::CodecError;
pub use framed::RespStream;
pub use resp_codec::RespCodec;
