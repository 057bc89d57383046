//! Authentication: password hashing, signed claims tokens and session handling.

mod password;
pub mod session;
mod token;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use session::{SESSION_BAN_LATCH_KEY, SESSION_TOKEN_KEY};
pub use token::{TokenError, TokenSigner, VerifiedToken};

