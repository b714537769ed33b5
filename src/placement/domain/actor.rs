//! Acting principals as supplied by the identity service.

use super::{ParseRoleError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Medical student applying to and completing internships.
    Student,
    /// Supervising or reviewing doctor.
    Doctor,
    /// Academic tutor writing evaluations.
    Tutor,
    /// Hospital account reviewing applications for its offers.
    Hospital,
    /// Platform administrator.
    Admin,
    /// Internal authority used by the sweep and by cascades.
    System,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Doctor => "doctor",
            Self::Tutor => "tutor",
            Self::Hospital => "hospital",
            Self::Admin => "admin",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "doctor" => Ok(Self::Doctor),
            "tutor" => Ok(Self::Tutor),
            "hospital" => Ok(Self::Hospital),
            "admin" => Ok(Self::Admin),
            "system" => Ok(Self::System),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

/// Authenticated principal requesting an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Principal identifier.
    pub id: UserId,
    /// Principal role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor from an identity and role.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns the system authority.
    #[must_use]
    pub const fn system() -> Self {
        Self::new(UserId::SYSTEM, Role::System)
    }

    /// Returns `true` when the actor is the system authority.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        matches!(self.role, Role::System)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}
