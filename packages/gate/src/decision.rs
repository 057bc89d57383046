//! # The decision function
//!
//! [`Gate::evaluate`] runs the checks in a fixed order and stops at the first
//! one that does not allow the request:
//!
//! 1. authorization predicate: static assets and public routes pass, anonymous
//!    callers are sent to the login page (or get a `401` on API routes);
//! 2. ban check: banned sessions are evicted with `sign_out` set;
//! 3. onboarding gate: non-admins with an unfinished profile are held on the
//!    onboarding route, finished ones are kept off it;
//! 4. role gate: admin routes require the admin role.
//!
//! API routes never receive a redirect. A browser following a `303` on a
//! `fetch` for JSON would hand an HTML body to a JSON parser.

use tracing::trace;

use crate::claims::{Claims, SessionState};
use crate::config::GateConfig;
use crate::route::RouteClass;

/// Structured rejection for API callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Unauthorized,
    Banned,
    Forbidden,
}

impl Rejection {
    pub fn status(&self) -> u16 {
        match self {
            Rejection::Unauthorized | Rejection::Banned => 401,
            Rejection::Forbidden => 403,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Rejection::Unauthorized => "Unauthorized",
            Rejection::Banned => "Banned",
            Rejection::Forbidden => "Forbidden",
        }
    }
}

/// Where the request goes next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    Redirect(String),
    Reject(Rejection),
}

/// Gate verdict for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub outcome: Outcome,
    /// The session must be terminated. Callers perform this without waiting.
    pub sign_out: bool,
}

impl Decision {
    pub fn allow() -> Self {
        Self::from(Outcome::Allow)
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == Outcome::Allow
    }
}

impl From<Outcome> for Decision {
    fn from(outcome: Outcome) -> Self {
        Self {
            outcome,
            sign_out: false,
        }
    }
}

/// The composed access gate. Immutable; share it behind an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct Gate {
    config: GateConfig,
}

impl Gate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass::classify(path, &self.config)
    }

    /// Cheap pre-gate check. Only says whether a caller may proceed to the
    /// finer checks at all; it never looks at claim contents.
    pub fn authorized(&self, route: &RouteClass, session: &SessionState) -> bool {
        route.is_static || route.is_public || session.is_authenticated()
    }

    /// Decide what happens to a request for `path` made with `session`.
    pub fn evaluate(&self, path: &str, session: &SessionState) -> Decision {
        let route = self.classify(path);
        let decision = self.decide(&route, session);
        trace!(path, ?route, ?decision, "gate evaluated");
        decision
    }

    fn decide(&self, route: &RouteClass, session: &SessionState) -> Decision {
        if !self.authorized(route, session) {
            return self.deny(route, Rejection::Unauthorized, &self.config.login_path);
        }
        let claims = match session {
            SessionState::Authenticated(claims) if !route.is_static && !route.is_public => claims,
            _ => return Decision::allow(),
        };

        if claims.is_banned {
            let mut decision =
                self.deny(route, Rejection::Banned, &self.config.banned_location());
            decision.sign_out = true;
            return decision;
        }
        if let Some(outcome) = self.onboarding(route, claims) {
            return outcome.into();
        }
        if route.is_admin && !claims.role.is_admin() {
            return self.deny(route, Rejection::Forbidden, &self.config.landing_path);
        }
        Decision::allow()
    }

    fn onboarding(&self, route: &RouteClass, claims: &Claims) -> Option<Outcome> {
        if claims.role.is_admin() {
            return None;
        }
        match (claims.onboarding_complete, route.is_onboarding) {
            (false, _) if route.is_static || route.is_api => None,
            (false, false) => Some(Outcome::Redirect(self.config.onboarding_path.clone())),
            (true, true) => Some(Outcome::Redirect(self.config.landing_path.clone())),
            _ => None,
        }
    }

    fn deny(&self, route: &RouteClass, rejection: Rejection, location: &str) -> Decision {
        if route.is_api {
            Outcome::Reject(rejection).into()
        } else {
            Outcome::Redirect(location.to_string()).into()
        }
    }
}
