use axum::{extract::State, Json};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::auth::session;
use crate::error::ApiError;
use crate::guard::Live;
use crate::models::UserInfo;
use crate::state::AppState;

const MAX_DISPLAY_NAME_LEN: usize = 50;
const MAX_BIO_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Save the profile basics and mark onboarding as finished. The session token
/// is re-issued so the edge gate stops holding the user on `/onboarding`.
pub async fn complete(
    State(state): State<AppState>,
    Live(user): Live,
    session: Session,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest("Display name is required".into()));
    }
    if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Display name must be at most {} characters",
            MAX_DISPLAY_NAME_LEN
        )));
    }
    let bio = request
        .bio
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    if bio.is_some_and(|b| b.chars().count() > MAX_BIO_LEN) {
        return Err(ApiError::BadRequest(format!(
            "Bio must be at most {} characters",
            MAX_BIO_LEN
        )));
    }

    let user = state
        .users
        .complete_onboarding(user.id, display_name, bio)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    session::store_token(&session, &state.tokens, &user.claims()).await?;
    info!(user = %user.id, "Onboarding complete");
    Ok(Json(user.to_info()))
}
