//! # Gate configuration: allow-lists and well-known paths
//!
//! Everything the gate matches a request path against lives in [`GateConfig`].
//! Deployments override it through the `[gate]` table of the server settings;
//! any field left out keeps its default.
//!
//! ```toml
//! [gate]
//! static_extensions = ["js", "css", "png"]
//! public_prefixes = ["/login", "/register", "/api/auth"]
//! onboarding_path = "/onboarding"
//! admin_prefix = "/admin"
//! api_prefix = "/api"
//! landing_path = "/discover"
//! login_path = "/login"
//! banned_error = "Banned"
//! ```

use serde::{Deserialize, Serialize};

/// Route allow-lists and redirect targets used by [`crate::Gate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// File extensions (without the dot) served as static assets.
    pub static_extensions: Vec<String>,
    /// Paths reachable without a session, matched exactly or as a parent segment.
    pub public_prefixes: Vec<String>,
    /// The onboarding page.
    pub onboarding_path: String,
    /// Prefix of admin-only routes. Also applied inside the API namespace.
    pub admin_prefix: String,
    /// Prefix of the JSON API namespace.
    pub api_prefix: String,
    /// Where signed-in users land by default.
    pub landing_path: String,
    /// Where anonymous and evicted users are sent.
    pub login_path: String,
    /// Error code appended to the login path when a banned session is evicted.
    pub banned_error: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            static_extensions: [
                "js",
                "css",
                "png",
                "jpg",
                "jpeg",
                "gif",
                "svg",
                "ico",
                "json",
                "webmanifest",
                "txt",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            public_prefixes: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/api/auth".to_string(),
            ],
            onboarding_path: "/onboarding".to_string(),
            admin_prefix: "/admin".to_string(),
            api_prefix: "/api".to_string(),
            landing_path: "/discover".to_string(),
            login_path: "/login".to_string(),
            banned_error: "Banned".to_string(),
        }
    }
}

impl GateConfig {
    /// Location a banned session is sent to after eviction.
    pub fn banned_location(&self) -> String {
        format!("{}?error={}", self.login_path, self.banned_error)
    }

    /// Admin prefix as seen from inside the API namespace, e.g. `/api/admin`.
    pub fn admin_api_prefix(&self) -> String {
        format!(
            "{}{}",
            self.api_prefix.trim_end_matches('/'),
            self.admin_prefix
        )
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
