//! Route classification, computed fresh for every request path.

use crate::config::GateConfig;

/// What kind of route a path is, as far as the gate cares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteClass {
    pub is_static: bool,
    pub is_api: bool,
    pub is_public: bool,
    pub is_onboarding: bool,
    pub is_admin: bool,
}

impl RouteClass {
    /// Classify a request path. Query strings must already be stripped.
    pub fn classify(path: &str, config: &GateConfig) -> Self {
        Self {
            is_static: has_static_extension(path, &config.static_extensions),
            is_api: under_prefix(path, &config.api_prefix),
            is_public: config
                .public_prefixes
                .iter()
                .any(|prefix| under_prefix(path, prefix)),
            is_onboarding: trim_trailing_slash(path)
                == trim_trailing_slash(&config.onboarding_path),
            is_admin: under_prefix(path, &config.admin_prefix)
                || under_prefix(path, &config.admin_api_prefix()),
        }
    }
}

/// `path` equals `prefix` or is nested below it at a segment boundary.
fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = trim_trailing_slash(prefix);
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn has_static_extension(path: &str, extensions: &[String]) -> bool {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let Some((stem, ext)) = segment.rsplit_once('.') else {
        return false;
    };
    !stem.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
