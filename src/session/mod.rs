pub mod store;

pub use store::{FileStore, MemoryStore};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::gateway::ApiResponse;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Session lock poisoned")]
    Poisoned,
}

/// Coarse authorization tier cached next to the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The signed-in state: at most one token and one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<Role>,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Option<Role>) -> Self {
        Session {
            token: Some(token.into()),
            role,
        }
    }

    /// Builds a session from a login or registration body.
    ///
    /// Returns `None` when the backend did not hand out a token. An
    /// unrecognised role string is dropped rather than rejected.
    pub fn from_auth_response(response: &ApiResponse) -> Option<Self> {
        let token = response.token.as_deref().filter(|t| !t.is_empty())?;
        let role = response.role.as_deref().and_then(|r| r.parse().ok());
        Some(Session::new(token, role))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_user(&self) -> bool {
        self.role == Some(Role::User)
    }
}

/// Persistence for the current session.
///
/// `save` replaces both keys at once; `clear` succeeds when nothing is stored.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session, SessionError>;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_response(token: Option<&str>, role: Option<&str>) -> ApiResponse {
        ApiResponse {
            status_code: Some(200),
            message: Some("successful".to_string()),
            token: token.map(str::to_string),
            role: role.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_role_round_trips_through_strings() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("USER".parse::<Role>(), Ok(Role::User));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn test_admin_and_user_predicates() {
        let admin = Session::new("tok", Some(Role::Admin));
        assert!(admin.is_admin());
        assert!(!admin.is_user());

        let user = Session::new("tok", Some(Role::User));
        assert!(user.is_user());
        assert!(!user.is_admin());

        let nobody = Session::new("tok", None);
        assert!(!nobody.is_admin());
        assert!(!nobody.is_user());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        assert!(!Session::default().is_authenticated());
        assert!(!Session::new("", None).is_authenticated());
        assert!(Session::new("abc", None).is_authenticated());
    }

    #[test]
    fn test_from_auth_response() {
        let session = Session::from_auth_response(&auth_response(Some("jwt"), Some("ADMIN")))
            .expect("session");
        assert_eq!(session.token.as_deref(), Some("jwt"));
        assert_eq!(session.role, Some(Role::Admin));

        let session = Session::from_auth_response(&auth_response(Some("jwt"), Some("GUEST")))
            .expect("session");
        assert_eq!(session.role, None);

        assert!(Session::from_auth_response(&auth_response(None, Some("USER"))).is_none());
        assert!(Session::from_auth_response(&auth_response(Some(""), Some("USER"))).is_none());
    }
}
