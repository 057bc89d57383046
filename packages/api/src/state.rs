use std::sync::Arc;
use std::time::Duration;

use gate::Gate;

use crate::auth::TokenSigner;
use crate::db::UserStore;
use crate::settings::{Features, Settings};

/// Shared state handed to every handler and to both gate entry points.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<Gate>,
    pub tokens: Arc<TokenSigner>,
    pub users: Arc<dyn UserStore>,
    pub features: Features,
}

impl AppState {
    pub fn new(settings: &Settings, users: Arc<dyn UserStore>) -> Self {
        Self {
            gate: Arc::new(Gate::new(settings.gate.clone())),
            tokens: Arc::new(TokenSigner::new(
                settings.auth.jwt_secret.as_bytes(),
                Duration::from_secs(settings.auth.token_ttl_secs),
            )),
            users,
            features: settings.features.clone(),
        }
    }
}
