//! Account credential kinds.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which account credential is being viewed or changed.
///
/// Serialized exactly as the backend expects in the `selected` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    /// Account email.
    Email,
    /// Login username.
    Username,
    /// Password.
    Password,
}

impl CredentialKind {
    /// Every kind, in menu order.
    pub const ALL: [Self; 3] = [Self::Email, Self::Username, Self::Password];

    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Username => "Username",
            Self::Password => "Password",
        }
    }

    /// Whether changing this credential requires typing it twice.
    #[must_use]
    pub const fn needs_confirmation(self) -> bool {
        matches!(self, Self::Email | Self::Password)
    }

    /// Whether the current value can be fetched and shown.
    #[must_use]
    pub const fn is_viewable(self) -> bool {
        matches!(self, Self::Email | Self::Username)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown credential: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name() {
        assert_eq!(
            serde_json::to_string(&CredentialKind::Username).unwrap(),
            "\"Username\""
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "password".parse::<CredentialKind>().unwrap(),
            CredentialKind::Password
        );
        assert!("pin".parse::<CredentialKind>().is_err());
    }

    #[test]
    fn test_flags() {
        assert!(CredentialKind::Email.needs_confirmation());
        assert!(!CredentialKind::Username.needs_confirmation());
        assert!(!CredentialKind::Password.is_viewable());
    }
}
