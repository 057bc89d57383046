//! Push subscription stubs. Delivery is not implemented; these only record
//! which browser endpoints belong to which user. Both answer `404` while the
//! `push` feature is off.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::guard::Live;
use crate::models::PushSubscription;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

pub async fn subscribe(
    State(state): State<AppState>,
    Live(user): Live,
    Json(subscription): Json<PushSubscription>,
) -> Result<StatusCode, ApiError> {
    if !state.features.push {
        return Err(ApiError::feature_disabled());
    }
    if !subscription.endpoint.starts_with("https://") {
        return Err(ApiError::BadRequest(
            "Subscription endpoint must be an https URL".into(),
        ));
    }

    state
        .users
        .save_push_subscription(user.id, &subscription)
        .await?;
    debug!(user = %user.id, "Saved push subscription");
    Ok(StatusCode::CREATED)
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Live(user): Live,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<StatusCode, ApiError> {
    if !state.features.push {
        return Err(ApiError::feature_disabled());
    }

    if state
        .users
        .delete_push_subscription(user.id, &request.endpoint)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Subscription not found".into()))
    }
}
