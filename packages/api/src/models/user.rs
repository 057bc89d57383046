//! # User model
//!
//! [`User`] is the full row of the `users` table and the source of truth the
//! live boundary checks claims against. Its access-relevant columns are
//! `role`, `is_banned` and `onboarding_complete`; [`User::claims`] projects
//! them into the snapshot that goes into a session token.
//!
//! [`UserInfo`] is the client-safe projection returned by the JSON API. It
//! omits the password hash and timestamps.

use chrono::{DateTime, Utc};
use gate::{Claims, Role};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub is_banned: bool,
    pub onboarding_complete: bool,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Parsed role. Unknown values fall back to the unprivileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    /// Claims snapshot for a session token.
    pub fn claims(&self) -> Claims {
        Claims::new(self.id.to_string(), self.role())
            .banned(self.is_banned)
            .onboarded(self.onboarding_complete)
    }

    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.to_string(),
            email: self.email.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
            role: self.role(),
            is_banned: self.is_banned,
            onboarding_complete: self.onboarding_complete,
        }
    }
}

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    pub is_banned: bool,
    pub onboarding_complete: bool,
}

impl UserInfo {
    /// Get display name, falling back to the account name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}
