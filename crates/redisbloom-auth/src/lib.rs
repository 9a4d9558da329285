//! # redisbloom-auth
//!
//! Authentication for connections to a Redis server running RedisBloom.
//!
//! Two forms are supported:
//!
//! - **Password** (`requirepass`): `AUTH <password>`
//! - **ACL user** (Redis 6+): `AUTH <username> <password>`
//!
//! Credentials are applied to every connection a pool opens. A rejected
//! credential is reported once per connection attempt and never retried.
//!
//! ## Secure Credential Handling
//!
//! Enable the `zeroize` feature to wipe secrets from memory when
//! [`Credentials`] is dropped.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod credentials;
pub mod error;

pub use credentials::{AuthMethod, Credentials, verify_auth_reply};
pub use error::AuthError;
