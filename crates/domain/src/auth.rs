//! Row-level authorization for orders.
//!
//! Admins may act on any order. Everyone else may only act on orders they
//! placed. The guard is a pure function of (role, requester, owner) so every
//! order operation runs the same check.

use std::str::FromStr;

use common::{ParseStatusError, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shopper; restricted to their own orders.
    #[default]
    User,

    /// Pantry staff or administrator; bypasses ownership.
    Admin,
}

impl Role {
    /// Returns the role as its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Returns true for the admin role.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ParseStatusError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// The identity performing an operation, resolved upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Creates a regular shopper.
    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, Role::User)
    }

    /// Creates an admin.
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Returns true if the actor is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Returns true if `requester` with `role` may access a row owned by `owner`.
pub fn can_access(role: Role, requester: UserId, owner: UserId) -> bool {
    role.is_admin() || requester == owner
}

/// Fails with `Unauthorized` unless the actor may act on a row owned by `owner`.
pub fn authorize(actor: &Actor, owner: UserId, action: &'static str) -> Result<()> {
    if can_access(actor.role, actor.user_id, owner) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized { action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_access() {
        let owner = UserId::new();
        assert!(can_access(Role::User, owner, owner));
    }

    #[test]
    fn stranger_may_not_access() {
        assert!(!can_access(Role::User, UserId::new(), UserId::new()));
    }

    #[test]
    fn admin_bypasses_ownership() {
        assert!(can_access(Role::Admin, UserId::new(), UserId::new()));
    }

    #[test]
    fn authorize_reports_action() {
        let actor = Actor::user(UserId::new());
        let err = authorize(&actor, UserId::new(), "cancel").unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { action: "cancel" }));
        assert_eq!(err.to_string(), "Unauthorized to cancel this order");
    }

    #[test]
    fn role_string_codec() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("staff".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }
}
