//! Error types for the harness.
//!
//! Only two classes reach a caller of [`ProbeSession::run`]: invalid input,
//! rejected before any browser is launched, and setup failures. Everything a
//! step does wrong is recorded in the report instead.
//!
//! [`ProbeSession::run`]: crate::ProbeSession::run

use thiserror::Error;

/// Errors that can occur in harness operations.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Scenario failed validation
    #[error("invalid scenario {scenario}: {reason}")]
    Validation {
        /// Scenario being validated
        scenario: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Browser, context or page could not be acquired
    #[error("browser setup failed: {0}")]
    Setup(#[from] probe_browser::BrowserError),

    /// Scenario definition not found
    #[error("scenario not found: {scenario_id}")]
    NotFound {
        /// The scenario ID that was not found
        scenario_id: String,
    },

    /// Failed to read a scenario file
    #[error("failed to load scenario from {path}: {source}")]
    LoadError {
        /// Path to the scenario file
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse scenario TOML
    #[error("failed to parse scenario TOML in {path}: {source}")]
    ParseError {
        /// Path to the scenario file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Scenario directory not found
    #[error("scenario directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// I/O error while accessing scenario files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid identifier or URL
    #[error(transparent)]
    Core(#[from] probe_core::ProbeError),
}

impl HarnessError {
    pub(crate) fn invalid(scenario: impl ToString, reason: impl Into<String>) -> Self {
        Self::Validation {
            scenario: scenario.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
