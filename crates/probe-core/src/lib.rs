//! Probe Core - Foundation crate for the probe harness workspace.
//!
//! This crate provides the shared error types, configuration management and
//! validated identifiers that the browser and harness crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes (`ScenarioId`, `BaseUrl`)
//!
//! # Example
//!
//! ```rust
//! use probe_core::HarnessConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::default();
//! config.validate()?;
//! assert_eq!(config.timeouts.navigation_ms, 10_000);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{BrowserSettings, HarnessConfig, ScenarioSettings, TargetConfig, TimeoutConfig};
pub use error::{ConfigError, ConfigResult, ProbeError, Result};
pub use types::{BaseUrl, ScenarioId};
