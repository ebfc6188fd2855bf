//! Configuration for gae-opwait
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Settings come from a TOML file in the platform config directory (or an
//! explicit path). Command line flags override them.

pub mod config;
pub mod error;
pub mod wait;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ConfigError, Result};
pub use wait::WaitSettings;
