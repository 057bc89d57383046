//! Session resolution and sign-in/sign-out on top of `tower-sessions`.
//!
//! The server-side session holds a single signed token under
//! [`SESSION_TOKEN_KEY`]. Resolution never fails: a missing token, a store
//! error, a bad signature or an expired token all resolve to
//! [`SessionState::Anonymous`].

use gate::{BanLatch, Claims, SessionState};
use tower_sessions::Session;
use tracing::{debug, warn};

use super::token::{TokenSigner, VerifiedToken};
use crate::error::ApiError;

/// Key for storing the signed claims token in the session.
pub const SESSION_TOKEN_KEY: &str = "token";

/// Key for the ban latch of the loaded session.
pub const SESSION_BAN_LATCH_KEY: &str = "ban_latch";

/// Resolve the caller from the session's token.
pub async fn resolve(session: &Session, tokens: &TokenSigner) -> SessionState {
    load_token(session, tokens)
        .await
        .map(|token| token.claims)
        .into()
}

/// The session's token if it is present and valid.
pub async fn load_token(session: &Session, tokens: &TokenSigner) -> Option<VerifiedToken> {
    let token: String = match session.get(SESSION_TOKEN_KEY).await {
        Ok(token) => token?,
        Err(e) => {
            warn!("Failed to read session token: {}", e);
            return None;
        }
    };

    match tokens.decode(&token) {
        Ok(verified) => Some(verified),
        Err(e) => {
            debug!("Discarding session token: {}", e);
            None
        }
    }
}

/// Start a fresh session for `claims`.
pub async fn sign_in(
    session: &Session,
    tokens: &TokenSigner,
    claims: &Claims,
) -> Result<(), ApiError> {
    session.cycle_id().await?;
    session.remove_value(SESSION_BAN_LATCH_KEY).await?;
    store_token(session, tokens, claims).await
}

/// Replace the token in the current session, keeping its id.
pub async fn store_token(
    session: &Session,
    tokens: &TokenSigner,
    claims: &Claims,
) -> Result<(), ApiError> {
    let token = tokens.issue(claims)?;
    session.insert(SESSION_TOKEN_KEY, token).await?;
    Ok(())
}

/// Terminate the session. Flushing an already empty session is a no-op.
pub async fn sign_out(session: &Session) -> Result<(), ApiError> {
    session.flush().await?;
    Ok(())
}

/// Terminate the session in the background; the caller does not wait for it.
pub fn spawn_sign_out(session: Session) {
    tokio::spawn(async move {
        if let Err(e) = sign_out(&session).await {
            warn!("Background sign-out failed: {}", e);
        }
    });
}

/// Feed the ban flag into this session's latch. Returns whether the caller
/// should issue the sign-out now.
pub async fn observe_ban(session: &Session, is_banned: bool) -> bool {
    let mut latch: BanLatch = session
        .get(SESSION_BAN_LATCH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    let fire = latch.observe(is_banned);
    if let Err(e) = session.insert(SESSION_BAN_LATCH_KEY, latch).await {
        warn!("Failed to record ban latch: {}", e);
    }
    fire
}
