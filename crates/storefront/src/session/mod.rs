//! Local session persistence.
//!
//! The client keeps exactly one piece of durable state: the opaque token the
//! backend hands out on login or signup. Every identity-dependent screen
//! reads it on mount; logout clears every locally persisted key.
//!
//! # Stores
//!
//! - [`FileSessionStore`] - JSON key/value file, used by the `capelli` binary
//! - [`MemorySessionStore`] - in-process map, used by tests and ephemeral runs

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use core::fmt;
use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Storage key the token is persisted under.
pub const SESSION_KEY: &str = "@storage_Key";

/// Errors that can occur while reading or writing the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed.
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Opaque token identifying the logged-in user.
///
/// Implements `Debug` manually so the token never reaches logs.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// The raw token, for request bodies and storage only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SessionToken {}

/// What a screen knows about the session.
///
/// `Unresolved` and `Anonymous` are deliberately distinct: a screen that has
/// not heard back from storage yet must render a loading state instead of
/// treating the shopper as logged out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Storage has not answered yet.
    #[default]
    Unresolved,
    /// No token is stored.
    Anonymous,
    /// A token is stored.
    Authenticated(SessionToken),
}

impl SessionState {
    /// State for a completed storage read.
    #[must_use]
    pub fn resolved(token: Option<SessionToken>) -> Self {
        token.map_or(Self::Anonymous, Self::Authenticated)
    }

    /// The token, when authenticated.
    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        match self {
            Self::Authenticated(token) => Some(token),
            Self::Unresolved | Self::Anonymous => None,
        }
    }

    /// Whether storage has answered.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// Durable storage for the session token.
///
/// Writes are last-write-wins; `clear` removes every key the store holds,
/// not just the token.
pub trait SessionStore {
    /// Persist `token`, replacing any previous value.
    fn store(&self, token: &SessionToken) -> impl Future<Output = Result<(), SessionError>>;

    /// Read the stored token, if any.
    fn load(&self) -> impl Future<Output = Result<Option<SessionToken>, SessionError>>;

    /// Remove all locally persisted keys.
    fn clear(&self) -> impl Future<Output = Result<(), SessionError>>;
}
