//! # Database module: connection pool and user storage
//!
//! - [`get_pool`] / [`migrate`]: the lazy process-wide PostgreSQL pool and its
//!   schema migrations.
//! - [`UserStore`]: everything the handlers and the live boundary read or
//!   write about users and their push subscriptions. [`PgUserStore`] backs it
//!   with PostgreSQL; [`MemoryUserStore`] keeps everything in a map for tests
//!   and local runs without a database.

mod memory;
mod pool;
mod users;

pub use memory::MemoryUserStore;
pub use pool::{get_pool, migrate};
pub use users::{PgUserStore, UserStore};
