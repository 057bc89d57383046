//! The application router.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | [`pages::root`] |
//! | GET | `/login`, `/register` | [`pages::login`], [`pages::register`] |
//! | GET | `/discover` | [`pages::discover`] |
//! | GET | `/onboarding` | [`pages::onboarding`] |
//! | GET | `/admin` | [`pages::admin`] |
//! | POST | `/api/auth/register`, `/api/auth/login`, `/api/auth/logout` | [`auth`] |
//! | GET | `/api/auth/me` | [`auth::me`] |
//! | POST | `/api/onboarding/complete` | [`onboarding::complete`] |
//! | GET | `/api/admin/users` | [`admin::list_users`] |
//! | POST | `/api/admin/users/{id}/ban`, `/api/admin/users/{id}/role` | [`admin`] |
//! | POST | `/api/push/subscribe`, `/api/push/unsubscribe` | [`push`] |
//!
//! Anything else falls through to the static asset directory.

use std::path::Path;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::guard;
use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod onboarding;
pub mod pages;
pub mod push;

/// Build the router with the edge gate applied to every route and to the
/// asset fallback. The caller must add a `tower_sessions::SessionManagerLayer`
/// on top.
pub fn router(state: AppState, assets: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(pages::root))
        .route("/login", get(pages::login))
        .route("/register", get(pages::register))
        .route("/discover", get(pages::discover))
        .route("/onboarding", get(pages::onboarding))
        .route("/admin", get(pages::admin))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/onboarding/complete", post(onboarding::complete))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}/ban", post(admin::set_ban))
        .route("/api/admin/users/{id}/role", post(admin::set_role))
        .route("/api/push/subscribe", post(push::subscribe))
        .route("/api/push/unsubscribe", post(push::unsubscribe))
        .fallback_service(ServeDir::new(assets.as_ref()))
        .layer(middleware::from_fn_with_state(state.clone(), guard::edge))
        .with_state(state)
}
