//! Account routes: register, password login, logout and the current user.
//! All of them sit under the public `/api/auth` prefix.

use axum::{extract::State, http::StatusCode, Json};
use gate::{Role, SessionState};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, session, verify_password, MIN_PASSWORD_LEN};
use crate::error::ApiError;
use crate::models::{NewUser, UserInfo};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register a new user with email and password, then sign them in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let email = request.email.trim().to_lowercase();
    let name = request.name.trim().to_string();

    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let user = state
        .users
        .create(NewUser {
            email,
            name,
            password_hash: hash_password(&request.password)?,
            role: Role::User,
        })
        .await?
        .ok_or_else(|| ApiError::Conflict("An account with this email already exists".into()))?;

    session::sign_in(&session, &state.tokens, &user.claims()).await?;
    info!(user = %user.id, "Registered new account");
    Ok(Json(user.to_info()))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let email = request.email.trim().to_lowercase();

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    let hash = user
        .password_hash
        .as_deref()
        .ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(&request.password, hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    session::sign_in(&session, &state.tokens, &user.claims()).await?;
    info!(user = %user.id, "Signed in");
    Ok(Json(user.to_info()))
}

/// Log out the current user by clearing the session.
pub async fn logout(session: Session) -> Result<StatusCode, ApiError> {
    session::sign_out(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user as currently stored, or `null`.
pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Option<UserInfo>>, ApiError> {
    let SessionState::Authenticated(claims) = session::resolve(&session, &state.tokens).await
    else {
        return Ok(Json(None));
    };
    let Ok(id) = Uuid::parse_str(&claims.sub) else {
        return Ok(Json(None));
    };

    let user = state.users.find(id).await?;
    Ok(Json(user.map(|u| u.to_info())))
}
