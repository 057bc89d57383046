//! Web Push subscriptions, stored verbatim for a future delivery pipeline.

use serde::{Deserialize, Serialize};

/// Keys of a browser `PushSubscription`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A browser `PushSubscription` as produced by `PushManager.subscribe()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}
