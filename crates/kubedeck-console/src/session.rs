//! Logged-in user and access gating for admin views

use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub roles: Vec<String>,
}

impl UserInfo {
    pub fn new(name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// An authenticated session. Created at login and consumed by [`Session::logout`].
#[derive(Clone, Debug)]
pub struct Session {
    user: UserInfo,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn login(user: UserInfo) -> Self {
        info!(user = %user.name, "session started");
        Self {
            user,
            started_at: Utc::now(),
        }
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn logout(self) {
        info!(user = %self.user.name, "session ended");
    }
}

/// Decides whether a user may see admin-only views
pub trait AccessPolicy: Send + Sync {
    fn is_authorized(&self, user: &UserInfo) -> bool;
}

/// Grants access to users holding one role
#[derive(Clone, Debug)]
pub struct RoleRequirement {
    role: String,
}

impl RoleRequirement {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl AccessPolicy for RoleRequirement {
    fn is_authorized(&self, user: &UserInfo) -> bool {
        user.has_role(&self.role)
    }
}

/// Outcome of gating a view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Render nothing and send the user elsewhere
    Redirect,
}

pub fn gate(session: &Session, policy: &dyn AccessPolicy, admin_only: bool) -> Access {
    if !admin_only || policy.is_authorized(session.user()) {
        Access::Granted
    } else {
        Access::Redirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate() {
        let policy = RoleRequirement::new("admin");
        let admin = Session::login(UserInfo::new("root", vec!["admin".to_string()]));
        let viewer = Session::login(UserInfo::new("bob", vec!["viewer".to_string()]));

        assert_eq!(gate(&admin, &policy, true), Access::Granted);
        assert_eq!(gate(&viewer, &policy, true), Access::Redirect);
        assert_eq!(gate(&viewer, &policy, false), Access::Granted);
    }
}
