//! User identity types

use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the identity provider.
///
/// This is not a UUID: the identity provider owns the format and we
/// treat it as an opaque stable string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user ID from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role claim carried by the identity provider's user record.
///
/// Absence of a claim means `User`; anything the provider reports that
/// we do not recognize also maps to `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular authenticated user (no role claim)
    #[default]
    User,
    /// Administrator
    Admin,
}

impl Role {
    /// Whether this role carries the admin claim
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Map a raw provider claim to a role. Unknown claims are `User`.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("admin") => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_claim() {
        assert_eq!(Role::from_claim(Some("admin")), Role::Admin);
        assert_eq!(Role::from_claim(Some("moderator")), Role::User);
        assert_eq!(Role::from_claim(Some("")), Role::User);
        assert_eq!(Role::from_claim(None), Role::User);
    }

    #[test]
    fn user_id_is_transparent_in_json() {
        let id = UserId::new("user_2aXb9Qk");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""user_2aXb9Qk""#);
    }
}
