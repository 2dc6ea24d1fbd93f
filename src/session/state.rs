//! Session states

use crate::models::{enums::Role, user::User};

/// An authenticated user and the token that proves it
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Stored token not resolved yet
    #[default]
    Loading,
    Anonymous,
    /// Logged in, but nothing except the password change is reachable
    MustChangePassword(Session),
    Active(Session),
}

impl SessionState {
    /// State right after a successful login or token restore
    pub fn authenticated(user: User, token: String) -> Self {
        let must_change = user.must_change_password;
        let session = Session { user, token };
        if must_change {
            SessionState::MustChangePassword(session)
        } else {
            SessionState::Active(session)
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::MustChangePassword(session) | SessionState::Active(session) => Some(session),
            SessionState::Loading | SessionState::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn role(&self) -> Option<&Role> {
        self.user().map(|u| &u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Anonymous => "anonymous",
            SessionState::MustChangePassword(_) => "must-change-password",
            SessionState::Active(_) => "active",
        }
    }
}
