//! # redisbloom
//!
//! Async client for the RedisBloom Bloom filter and Top-K commands.
//!
//! This is the primary public API surface of the workspace. A [`Client`]
//! owns a connection pool over one or more server addresses; with several
//! addresses each command is sent to one picked at random.
//!
//! ## Features
//!
//! - **Bounded pooling**: per-address connection ceiling with bounded waits
//! - **Multi-address**: random host selection per command
//! - **Scoped release**: connections go back to their pool on every exit path
//! - **Typed replies**: each command returns a Rust type, not a raw reply
//!
//! ## Example
//!
//! ```rust,ignore
//! use redisbloom::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("10.0.0.1:6379,10.0.0.2:6379", "filters", None)?;
//!
//!     client.bf_reserve("seen", 0.001, 100_000).await?;
//!     client.bf_add("seen", "user:42").await?;
//!     assert!(client.bf_exists("seen", "user:42").await?);
//!
//!     client.topk_reserve("hot", 10, 2000, 7, 0.925).await?;
//!     client.topk_add("hot", ["a", "b", "a"]).await?;
//!     println!("{:?}", client.topk_list("hot").await?);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bloom;
pub mod client;
pub mod config;
pub mod error;
pub mod topk;

// Re-export commonly used types
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use redisbloom_auth::Credentials;
pub use redisbloom_pool::{Pool, PoolConfig, PoolStatus};
pub use resp_protocol::{Command, Value};
