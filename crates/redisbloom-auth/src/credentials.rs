//! Connection credentials.

use resp_protocol::{Command, Value};

use crate::error::AuthError;

/// How a connection authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Single shared password (`requirepass`).
    Password,
    /// Named ACL user with a password.
    Acl,
}

/// Secret applied to every connection opened against a server.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize, zeroize::ZeroizeOnDrop))]
pub struct Credentials {
    username: Option<String>,
    password: String,
}

impl Credentials {
    /// Password-only credentials.
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            username: None,
            password: password.into(),
        }
    }

    /// ACL username and password.
    pub fn acl(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: password.into(),
        }
    }

    /// Get the ACL username, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Get the authentication method.
    #[must_use]
    pub fn method(&self) -> AuthMethod {
        if self.username.is_some() {
            AuthMethod::Acl
        } else {
            AuthMethod::Password
        }
    }

    /// Build the AUTH command for these credentials.
    #[must_use]
    pub fn auth_command(&self) -> Command {
        let command = Command::new("AUTH");
        match &self.username {
            Some(user) => command.arg(user.as_str()).arg(self.password.as_str()),
            None => command.arg(self.password.as_str()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Check the server's reply to AUTH.
pub fn verify_auth_reply(reply: &Value) -> Result<(), AuthError> {
    match reply {
        Value::Simple(_) => Ok(()),
        Value::Error(message) => {
            tracing::warn!(error = %message, "server rejected credentials");
            Err(AuthError::Rejected(message.clone()))
        }
        other => Err(AuthError::UnexpectedReply(other.type_name())),
    }
}
