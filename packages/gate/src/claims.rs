//! Session claims: what the gate trusts about a caller without a store lookup.

use serde::{Deserialize, Serialize};

/// Role of an authenticated principal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Snapshot of a principal taken when its session token was issued.
///
/// Claims are never refreshed during a request. A user banned or demoted after
/// issuance keeps the old snapshot until the token is re-issued, which is why
/// privileged handlers confirm against the store instead of trusting these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Opaque identifier of the principal.
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub onboarding_complete: bool,
}

impl Claims {
    pub fn new(sub: impl Into<String>, role: Role) -> Self {
        Self {
            sub: sub.into(),
            role,
            is_banned: false,
            onboarding_complete: false,
        }
    }

    pub fn banned(mut self, is_banned: bool) -> Self {
        self.is_banned = is_banned;
        self
    }

    pub fn onboarded(mut self, onboarding_complete: bool) -> Self {
        self.onboarding_complete = onboarding_complete;
        self
    }
}

/// Result of session resolution. Any failure to resolve is `Anonymous`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Claims),
}

impl SessionState {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(claims) => Some(claims),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims().is_some()
    }
}

impl From<Option<Claims>> for SessionState {
    fn from(claims: Option<Claims>) -> Self {
        claims.map_or(SessionState::Anonymous, SessionState::Authenticated)
    }
}
