//! User domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User permission level.
///
/// Wire and storage format: lowercase string (`"user"`, `"moderator"`, `"admin"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

/// Returned when a string does not name a [`UserRole`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user role: {0}")]
pub struct UnknownRole(pub String);

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    fn privilege(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Moderator => 1,
            Self::Admin => 2,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

impl PartialOrd for UserRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.privilege().cmp(&other.privilege())
    }
}

/// Capability tier of a request.
///
/// `Anonymous` has no account; the other tiers mirror [`UserRole`]. A superuser
/// account is always evaluated as `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Anonymous,
    User,
    Moderator,
    Admin,
}

impl Tier {
    pub fn from_account(role: UserRole, is_superuser: bool) -> Self {
        if is_superuser {
            return Self::Admin;
        }
        match role {
            UserRole::User => Self::User,
            UserRole::Moderator => Self::Moderator,
            UserRole::Admin => Self::Admin,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }

    /// Moderators and admins may act on feedback they did not author.
    pub fn is_staff(self) -> bool {
        self >= Self::Moderator
    }
}
