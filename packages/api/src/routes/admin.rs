//! Moderation routes under `/api/admin`. The edge gate rejects non-admin
//! tokens; [`Live`] re-checks the role against the store on every call.

use axum::{
    extract::{Path, State},
    Json,
};
use gate::Role;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard::Live;
use crate::models::UserInfo;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub banned: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

pub async fn list_users(
    State(state): State<AppState>,
    Live(_admin): Live,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.iter().map(|u| u.to_info()).collect()))
}

/// Ban or unban a user. Takes effect at the edge when the target's token is
/// next re-issued, and immediately wherever [`Live`] is used.
pub async fn set_ban(
    State(state): State<AppState>,
    Live(admin): Live,
    Path(id): Path<Uuid>,
    Json(request): Json<BanRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    if id == admin.id && request.banned {
        return Err(ApiError::BadRequest("Admins cannot ban themselves".into()));
    }

    let user = state
        .users
        .set_banned(id, request.banned)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(admin = %admin.id, user = %user.id, banned = request.banned, "Updated ban");
    Ok(Json(user.to_info()))
}

pub async fn set_role(
    State(state): State<AppState>,
    Live(admin): Live,
    Path(id): Path<Uuid>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state
        .users
        .set_role(id, request.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(admin = %admin.id, user = %user.id, role = %request.role, "Updated role");
    Ok(Json(user.to_info()))
}
