//! Engine for one round of the Werwolf social-deduction game: session
//! lifecycle, a generic phase-action voting engine, per-role behavior hooks
//! and cascading death resolution. Transport and persistence are left to the
//! embedding server; sessions push [`models::event::GameEvent`]s through a
//! broadcast channel instead.

pub mod error;
pub mod manager;
pub mod models;
pub mod phase_action;
pub mod roles;
pub mod session;
pub mod store;
pub mod utils;
