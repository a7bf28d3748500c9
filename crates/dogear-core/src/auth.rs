//! Session types consumed from the auth collaborator.
//!
//! The engine never issues or refreshes credentials; it receives an opaque
//! bearer token plus the acting user, and falls back to offline-only behavior
//! when no session exists.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Owner sentinel applied to highlights created without an authenticated session.
pub const OFFLINE_OWNER: &str = "offline-user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: Option<String>,
}

/// An authenticated reading session: an opaque bearer credential and its user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}
