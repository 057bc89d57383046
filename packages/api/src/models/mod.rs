//! Data models for the application.

mod push;
mod user;

pub use push::{PushKeys, PushSubscription};
pub use user::{NewUser, User, UserInfo};
