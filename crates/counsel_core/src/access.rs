//! crates/counsel_core/src/access.rs
//!
//! Role-gated access to pages and operations.

use crate::domain::{Role, User};

/// What is known about the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The identity provider has not answered yet.
    Resolving,
    Anonymous,
    Authenticated(User),
}

impl Identity {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Resolving | Self::Anonymous => None,
        }
    }
}

impl From<Option<User>> for Identity {
    fn from(user: Option<User>) -> Self {
        user.map_or(Self::Anonymous, Self::Authenticated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render nothing until the identity is known.
    Wait,
    Allow,
    RedirectToLogin,
    /// Signed in with another role; send the user to that role's home.
    RedirectToHome(Role),
}

#[must_use]
pub fn check_access(identity: &Identity, required: Role) -> AccessDecision {
    match identity {
        Identity::Resolving => AccessDecision::Wait,
        Identity::Anonymous => AccessDecision::RedirectToLogin,
        Identity::Authenticated(user) if user.role == required => AccessDecision::Allow,
        Identity::Authenticated(user) => AccessDecision::RedirectToHome(user.role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role) -> User {
        User {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn waits_while_identity_resolves() {
        assert_eq!(check_access(&Identity::Resolving, Role::Admin), AccessDecision::Wait);
    }

    #[test]
    fn anonymous_goes_to_login() {
        assert_eq!(
            check_access(&Identity::from(None), Role::Client),
            AccessDecision::RedirectToLogin
        );
    }

    #[test]
    fn wrong_role_goes_home() {
        let identity = Identity::Authenticated(user(Role::Client));
        assert_eq!(
            check_access(&identity, Role::Admin),
            AccessDecision::RedirectToHome(Role::Client)
        );
        assert_eq!(Role::Client.home_path(), "/dashboard");
    }

    #[test]
    fn matching_role_is_allowed() {
        let identity = Identity::from(Some(user(Role::Admin)));
        assert_eq!(check_access(&identity, Role::Admin), AccessDecision::Allow);
    }
}
