//! Melody server library.
//!
//! Exposes configuration, state, routes and the Telegram update loop so
//! integration tests and the binary entrypoint can both access them.

pub mod bot;
pub mod config;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
