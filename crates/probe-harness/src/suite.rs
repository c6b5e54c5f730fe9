//! Sequential execution of several scenarios.

use crate::outcome::ProbeReport;
use crate::scenario::Scenario;
use crate::session::ProbeSession;
use probe_browser::BrowserLauncher;
use probe_core::ScenarioId;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// Final state of one scenario in a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// The assertion held
    Passed,
    /// The probe ran but the assertion did not hold
    Failed {
        /// The scenario's failure message
        reason: String,
    },
    /// The probe could not run (invalid scenario or setup failure)
    Errored {
        /// Error description
        error: String,
    },
}

/// Result of one scenario in a suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that ran
    pub scenario: ScenarioId,
    /// Display name
    pub name: String,
    /// Final state
    pub status: ScenarioStatus,
    /// Full report, absent when the probe errored
    pub report: Option<ProbeReport>,
}

impl ScenarioResult {
    /// Check if the scenario passed
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed)
    }
}

/// Aggregate over a suite run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Scenarios attempted
    pub total: usize,
    /// Scenarios whose assertion held
    pub passed: usize,
    /// Scenarios whose assertion did not hold
    pub failed: usize,
    /// Scenarios that could not run
    pub errored: usize,
    /// Total wall time
    pub duration_ms: u64,
    /// Per-scenario results in run order
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    /// Check if every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Runs scenarios one after another, each with a fresh browser.
pub struct SuiteRunner<L> {
    session: ProbeSession<L>,
}

impl<L: BrowserLauncher> SuiteRunner<L> {
    /// Wrap a configured session.
    pub fn new(session: ProbeSession<L>) -> Self {
        Self { session }
    }

    /// Run every scenario in order.
    ///
    /// A scenario that cannot run is recorded as errored; the suite
    /// continues with the next one.
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let start = Instant::now();
        let mut report = SuiteReport {
            total: scenarios.len(),
            ..SuiteReport::default()
        };

        info!(count = scenarios.len(), "running suite");

        for scenario in scenarios {
            let result = match self.session.run(scenario).await {
                Ok(probe) => {
                    let status = if probe.passed {
                        report.passed += 1;
                        info!(scenario = %scenario.id(), duration_ms = probe.duration_ms, "passed");
                        ScenarioStatus::Passed
                    } else {
                        report.failed += 1;
                        let reason = probe.failure_reason.clone().unwrap_or_default();
                        error!(scenario = %scenario.id(), reason = %reason, "failed");
                        ScenarioStatus::Failed { reason }
                    };
                    ScenarioResult {
                        scenario: scenario.id().clone(),
                        name: scenario.display_name().to_string(),
                        status,
                        report: Some(probe),
                    }
                }
                Err(e) => {
                    report.errored += 1;
                    error!(scenario = %scenario.id(), error = %e, "errored");
                    ScenarioResult {
                        scenario: scenario.id().clone(),
                        name: scenario.display_name().to_string(),
                        status: ScenarioStatus::Errored {
                            error: e.to_string(),
                        },
                        report: None,
                    }
                }
            };
            report.results.push(result);
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            "suite finished"
        );

        report
    }
}
