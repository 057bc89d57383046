//! # API crate: server routes, access boundaries and data access for Kindred
//!
//! This crate wires the [`gate`] decision function into an axum application and
//! provides the handlers and storage behind it. The `web` binary only loads
//! settings, opens the database and serves [`routes::router`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2id password hashing, signed claims tokens, session sign-in/out and resolution |
//! | [`db`] | PostgreSQL pool and migrations, the [`db::UserStore`] trait and its Postgres and in-memory implementations |
//! | [`error`] | [`ApiError`], rendered as `{"error": ...}` with a stable status |
//! | [`guard`] | The two gate entry points: the [`guard::edge`] middleware and the [`guard::Live`] extractor |
//! | [`models`] | `User`, `UserInfo`, push subscriptions |
//! | [`routes`] | Page shells and JSON handlers, assembled by [`routes::router`] |
//! | [`settings`] | Layered configuration (defaults, `kindred.toml`, `KINDRED_*` env) |
//! | [`state`] | [`AppState`] shared by handlers |
//!
//! ## Request path
//!
//! `SessionManagerLayer` → [`guard::edge`] (token claims only) → handler. Handlers
//! for privileged routes and the admin/onboarding pages additionally take
//! [`guard::Live`], which re-evaluates the gate against the stored user record.

pub mod auth;
pub mod db;
pub mod error;
pub mod guard;
pub mod models;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::ApiError;
pub use models::UserInfo;
pub use settings::Settings;
pub use state::AppState;
