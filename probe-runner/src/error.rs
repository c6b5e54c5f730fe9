//! Errors that stop the runner before any probe starts.

use probe_core::ConfigError;
use probe_harness::HarnessError;
use thiserror::Error;

/// Exit code for a run where every scenario passed.
pub const EXIT_PASSED: u8 = 0;
/// Exit code when any scenario failed or errored.
pub const EXIT_FAILED: u8 = 1;
/// Exit code for configuration and catalogue problems.
pub const EXIT_USAGE: u8 = 2;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scenario catalogue error: {0}")]
    Scenarios(#[from] HarnessError),

    #[error("no scenarios selected")]
    NoScenarios,
}

impl RunnerError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        EXIT_USAGE
    }
}
