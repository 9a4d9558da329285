//! # redisbloom-pool
//!
//! Bounded connection pooling for RedisBloom servers.
//!
//! A [`SingleHostPool`] caps how many connections to one address are in use
//! at once and makes further callers wait, up to a configured timeout, for a
//! release. A [`MultiHostPool`] holds one such pool per address and picks one
//! uniformly at random for every checkout. [`Pool`] chooses between the two
//! from the number of configured addresses.
//!
//! ## Features
//!
//! - Per-address ceiling enforced by a semaphore, with bounded waiting
//! - Idle connection reuse, most recently returned first
//! - `PING` health check on borrow for connections idle past an interval
//! - Broken connections are discarded instead of recycled
//! - `AUTH` on every new connection when credentials are configured
//! - Status and metrics for observability
//!
//! ## Example
//!
//! ```rust,ignore
//! use redisbloom_pool::{Pool, PoolConfig};
//! use resp_protocol::Command;
//! use std::time::Duration;
//!
//! let pool = Pool::builder()
//!     .addresses(["10.0.0.1:6379", "10.0.0.2:6379"])
//!     .max_connections(100)
//!     .connection_timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! let mut conn = pool.get().await?;
//! let reply = conn.execute(&Command::new("BF.EXISTS").arg("filter").arg("item")).await?;
//! // Connection automatically returned to its sub-pool on drop
//!
//! let status = pool.status();
//! println!("Pool utilization: {:.1}%", status.utilization());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod multi;
pub mod pool;

// Configuration
pub use config::{DEFAULT_MAX_CONNECTIONS, PoolConfig, parse_addresses};

// Error types
pub use error::PoolError;

// Pool types
pub use connection::Connection;
pub use host::{PooledConnection, SingleHostPool};
pub use multi::MultiHostPool;
pub use pool::{Pool, PoolBuilder, PoolMetrics, PoolStatus};

// Lifecycle management
pub use lifecycle::{ConnectionMetadata, ConnectionState};
