//! Server-rendered page shells. The client bundle takes over once loaded;
//! these exist so every page route sits behind the same gate as the API.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::guard::Live;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// `/` sends signed-in users to the landing page; the edge gate has already
/// sent everyone else to the login page.
pub async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.gate.config().landing_path)
}

pub async fn login(Query(query): Query<LoginQuery>) -> Html<String> {
    let error = query
        .error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(&e)))
        .unwrap_or_default();
    shell("Log in", &error)
}

pub async fn register() -> Html<String> {
    shell("Create account", "")
}

pub async fn discover() -> Html<String> {
    shell("Discover", "")
}

pub async fn onboarding(Live(user): Live) -> Html<String> {
    shell(
        "Set up your profile",
        &format!("<p>Welcome, {}.</p>", escape(&user.name)),
    )
}

pub async fn admin(
    State(state): State<AppState>,
    Live(_admin): Live,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list().await?;
    let banned = users.iter().filter(|u| u.is_banned).count();
    Ok(shell(
        "Admin",
        &format!("<p>{} users, {} banned.</p>", users.len(), banned),
    ))
}

fn shell(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>{title} · Kindred</title><link rel="manifest" href="/manifest.webmanifest"></head>
<body><main><h1>{title}</h1>{body}</main><script type="module" src="/app.js"></script></body>
</html>"#
    ))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
