//! Once-per-session trigger for evicting banned sessions.

use serde::{Deserialize, Serialize};

/// Remembers the last ban flag seen for one loaded session.
///
/// [`observe`](BanLatch::observe) returns `true` only when the flag moves from
/// false or absent to true, so repeated requests on a session that is already
/// being signed out do not issue the sign-out again. A session that is unbanned
/// and then banned again re-arms the latch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanLatch {
    last_seen: Option<bool>,
}

impl BanLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current ban flag. Returns whether sign-out should fire now.
    pub fn observe(&mut self, is_banned: bool) -> bool {
        let fire = is_banned && self.last_seen != Some(true);
        self.last_seen = Some(is_banned);
        fire
    }
}
