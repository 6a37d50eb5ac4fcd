//! # parkade-server
//!
//! HTTP server library for the parkade parking lot system.
//!
//! This library provides the API handlers, logging setup and state
//! management used by the `parkade-server` binary.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;

pub use api::create_router;
pub use state::{AppState, SharedState};
