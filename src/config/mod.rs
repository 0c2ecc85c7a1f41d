//! Configuration model for lockdown.
//!
//! This module defines the Config struct read from a YAML file supplied by the
//! embedding application (or `--config` on the CLI). It supports
//! forward-compatible YAML parsing (unknown fields are ignored), defaults for
//! every field, and validation of config values.
//!
//! The config is threaded explicitly into each call; there is no process-wide
//! "disable restricted files" switch.

mod model;
mod operations;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::{
    Config, DEFAULT_DISPLAY_PATH_WIDTH, DEFAULT_SHARED_LOCK_PROBE_LIMIT,
};
