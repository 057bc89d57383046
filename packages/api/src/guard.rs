//! # Gate entry points
//!
//! Both entry points hand the request path and a [`SessionState`] to the same
//! [`gate::Gate::evaluate`] and differ only in where the claims come from.
//!
//! - [`edge`] is a middleware over the whole router. It trusts the signed
//!   token and never touches the database, so it is cheap enough to run on
//!   every request including static assets.
//! - [`Live`] is an extractor for privileged handlers and pages. It loads the
//!   user record and evaluates the gate against claims rebuilt from it, so a
//!   ban or demotion takes effect before the old token expires.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use gate::{Decision, Outcome, SessionState};
use tower_sessions::Session;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::session;
use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

/// Edge gate middleware. Runs inside the session layer.
pub async fn edge(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let caller = session::resolve(&session, &state.tokens).await;
    let decision = state.gate.evaluate(request.uri().path(), &caller);

    if decision.sign_out && session::observe_ban(&session, true).await {
        info!(
            sub = caller.claims().map(|c| c.sub.as_str()),
            "Signing out banned session"
        );
        session::spawn_sign_out(session);
    }

    match decision.outcome {
        Outcome::Allow => next.run(request).await,
        outcome => respond(outcome),
    }
}

/// Render a non-allowing outcome. `Allow` renders as an empty `200`.
fn respond(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Allow => ().into_response(),
        Outcome::Redirect(location) => Redirect::to(&location).into_response(),
        Outcome::Reject(rejection) => ApiError::from(rejection).into_response(),
    }
}

/// The caller's live user record, checked by the gate against the store.
pub struct Live(pub User);

impl FromRequestParts<AppState> for Live {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Response> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let path = parts.uri.path().to_string();

        let Some(token) = session::load_token(&session, &state.tokens).await else {
            let decision = state.gate.evaluate(&path, &SessionState::Anonymous);
            return Err(deny(decision, &path));
        };
        let token_claims = token.claims;

        let user = match load(state, &token_claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(sub = %token_claims.sub, "Session subject no longer exists");
                session::spawn_sign_out(session);
                let decision = state.gate.evaluate(&path, &SessionState::Anonymous);
                return Err(deny(decision, &path));
            }
            Err(e) if state.gate.classify(&path).is_api => return Err(e.into_response()),
            Err(e) => {
                error!(path = %path, "Failed to load session user: {}", e);
                return Err(
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
                );
            }
        };

        let live_claims = user.claims();
        let decision = state
            .gate
            .evaluate(&path, &SessionState::Authenticated(live_claims.clone()));

        if decision.sign_out {
            info!(sub = %live_claims.sub, "Signing out banned user");
            session::spawn_sign_out(session);
            return Err(respond(decision.outcome));
        }

        // Active sessions outlive a single token: refresh once it is half spent.
        if live_claims != token_claims || state.tokens.needs_refresh(token.issued_at) {
            debug!(sub = %live_claims.sub, "Re-issuing session token");
            if let Err(e) = session::store_token(&session, &state.tokens, &live_claims).await {
                warn!("Failed to re-issue session token: {}", e);
            }
        }

        match decision.outcome {
            Outcome::Allow => Ok(Live(user)),
            outcome => Err(respond(outcome)),
        }
    }
}

async fn load(state: &AppState, sub: &str) -> Result<Option<User>, ApiError> {
    let Ok(id) = Uuid::parse_str(sub) else {
        return Ok(None);
    };
    Ok(state.users.find(id).await?)
}

/// An anonymous caller on a route that still allowed them (public or static)
/// cannot be handed a user; treat it as unauthenticated.
fn deny(decision: Decision, path: &str) -> Response {
    match decision.outcome {
        Outcome::Allow => {
            debug!(path, "Live user required on an open route");
            ApiError::Unauthorized.into_response()
        }
        outcome => respond(outcome),
    }
}
