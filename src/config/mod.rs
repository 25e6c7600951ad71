//! Sweep Configuration Module
//!
//! Model constants, grid axes, and generation/analysis settings loaded from
//! TOML.
//!
//! ## Loading Order
//!
//! 1. `ASPECT_SWEEP_CONFIG` environment variable (path to TOML file)
//! 2. `sweep_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! A `--config` flag on the command line bypasses the search and fails hard
//! on a bad file.

mod sweep_config;
pub mod defaults;
pub mod validation;

pub use sweep_config::*;
