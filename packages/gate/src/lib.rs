//! # Gate crate: per-request access decisions for Kindred
//!
//! Every entry point of the server (the edge middleware, the live page and
//! handler boundary) asks the same question: may this caller see this path, and
//! if not, where do they go? This crate answers it with one pure function,
//! [`Gate::evaluate`], so the answer cannot drift between entry points.
//!
//! The crate has no server dependencies. It knows nothing about cookies, JWTs
//! or databases; callers hand it a [`SessionState`] and a request path.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | [`GateConfig`]: the allow-lists and well-known paths |
//! | [`claims`] | [`Claims`], [`Role`] and [`SessionState`] |
//! | [`route`] | [`RouteClass`]: static / api / public / onboarding / admin classification |
//! | [`decision`] | [`Gate`], [`Decision`], [`Outcome`], [`Rejection`] |
//! | [`ban`] | [`BanLatch`]: fires sign-out once per banned session |

pub mod ban;
pub mod claims;
pub mod config;
pub mod decision;
pub mod route;

pub use ban::BanLatch;
pub use claims::{Claims, Role, SessionState};
pub use config::GateConfig;
pub use decision::{Decision, Gate, Outcome, Rejection};
pub use route::RouteClass;
