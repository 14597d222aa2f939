use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, UserId};

/// Access role attached to every user.
///
/// A user holds exactly one role at a time; the role drives the lead
/// visibility filter and the mutation policy table in the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including the user directory.
    Admin,
    /// Full lead access and analytics, no user directory.
    Manager,
    /// Access restricted to leads the user owns.
    SalesExecutive,
}

impl Role {
    /// Returns the storage string for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::SalesExecutive => "sales_executive",
        }
    }

    /// Parses a storage string into a role.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "sales_executive" => Ok(Self::SalesExecutive),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// User information persisted in the authenticated session.
///
/// Carries no credential material; the password hash never leaves the user
/// repository's credential lookup path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    id: UserId,
    username: String,
    email: String,
    full_name: String,
    role: Role,
}

impl UserIdentity {
    /// Creates a user identity from persisted account data.
    #[must_use]
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
            role,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the unique username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the account email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Returns the access role for the current user.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_storage_strings_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::SalesExecutive] {
            let parsed = Role::parse(role.as_str());
            assert_eq!(parsed.ok(), Some(role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::parse("superuser").is_err());
    }
}
