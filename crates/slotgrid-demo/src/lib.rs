#![forbid(unsafe_code)]

//! Scripted editing sessions for the slotgrid layout engine.
//!
//! The binary arranges a grid, replays a step script through the engine's
//! public operations and prints the resulting snapshot, notifications and
//! rejected steps as JSON.

pub mod cli;
pub mod error;
pub mod script;

pub use cli::{Cli, run, run_from_env};
pub use error::{DemoError, Result};
