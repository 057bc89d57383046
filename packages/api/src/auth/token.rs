//! Signed session tokens (HS256 JWT) carrying the gate's [`Claims`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gate::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Wire form of a token: the claims plus issue and expiry times in epoch seconds.
#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims {
    #[serde(flatten)]
    claims: Claims,
    iat: u64,
    exp: u64,
}

/// A token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub claims: Claims,
    /// Issue time in epoch seconds.
    pub issued_at: u64,
}

/// Issues and verifies session tokens with a shared secret.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Sign `claims` as of now.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue_at(claims, now())
    }

    fn issue_at(&self, claims: &Claims, iat: u64) -> Result<String, TokenError> {
        let signed = SignedClaims {
            claims: claims.clone(),
            iat,
            exp: iat + self.ttl.as_secs(),
        };
        Ok(jsonwebtoken::encode(&Header::default(), &signed, &self.encoding)?)
    }

    /// Check signature and expiry and return the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        Ok(self.decode(token)?.claims)
    }

    /// Like [`verify`](Self::verify), keeping the issue time.
    pub fn decode(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data =
            jsonwebtoken::decode::<SignedClaims>(token, &self.decoding, &Validation::default())?;
        Ok(VerifiedToken {
            claims: data.claims.claims,
            issued_at: data.claims.iat,
        })
    }

    /// Whether a token issued at `issued_at` has used up half its lifetime.
    pub fn needs_refresh(&self, issued_at: u64) -> bool {
        now().saturating_sub(issued_at) >= self.ttl.as_secs() / 2
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
