//! Test infrastructure errors.

use thiserror::Error;

/// Errors raised while setting up test fixtures.
#[derive(Debug, Error)]
pub enum TestingError {
    /// Binding or inspecting the listener failed.
    #[error("mock server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A synchronization helper gave up waiting.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}
