//! linestash webhook server library.
//!
//! Exposes config, state, error handling, the event dispatcher and routes so
//! integration tests and the binary entrypoint share them.

pub mod config;
pub mod engine;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;
