//! Configuration for convergence budgets and status-code policies
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Every knob has a built-in default, so an empty or missing file yields a
//! working configuration:
//!
//! ```toml
//! [retry]
//! timeout_secs = 300
//! delay_ms = 5000
//!
//! [watch]
//! timeout_secs = 600
//! delay_ms = 10000
//! continuous_target_occurrence = 1
//!
//! [create]
//! stop = [201]
//! retry = [409, 424]
//!
//! [delete]
//! stop = [201, 204]
//! retry = [409, 424]
//! ```

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{ConvergenceConfig, RetryConfig, WatchConfig};
pub use error::{ConfigError, Result};
