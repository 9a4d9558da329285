//! # redisbloom-testing
//!
//! Test infrastructure for the RedisBloom client crates.
//!
//! [`MockServer`] speaks RESP on an ephemeral localhost port, emulates the
//! `BF.*` and `TOPK.*` commands in memory, and can be scripted to delay
//! replies, drop connections, or require a password.
//!
//! ```rust,ignore
//! use redisbloom_testing::{MockServer, Reply};
//!
//! let server = MockServer::builder()
//!     .password("secret")
//!     .handler(|args| (args[0] == "SLOW").then(|| Reply::Disconnect))
//!     .start()
//!     .await?;
//! let address = server.address();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod emulator;
pub mod error;
pub mod mock_server;

pub use emulator::Emulator;
pub use error::TestingError;
pub use mock_server::{Handler, MockServer, MockServerBuilder, Reply};

/// Install a test-friendly tracing subscriber, honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
