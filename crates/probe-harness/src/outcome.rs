//! Probe result types and tagged outcomes.

use chrono::{DateTime, Utc};
use probe_browser::FrameRef;
use probe_core::ScenarioId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a step's action ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The action completed within its budget
    Ok,
    /// The action exceeded its budget
    TimedOut,
    /// The navigation failed outright
    NavigationError {
        /// Error reported by the browser
        message: String,
    },
    /// The interaction failed outright
    InteractionError {
        /// Error reported by the browser
        message: String,
    },
}

impl StepOutcome {
    /// Check if the action completed
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// How a best-effort settle wait ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettleOutcome {
    /// Content loaded within budget
    Settled,
    /// Budget expired first
    TimedOut,
    /// The wait itself errored
    Failed {
        /// Error reported by the browser
        message: String,
    },
}

/// Settle outcome for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSettle {
    /// The frame waited on
    pub frame: FrameRef,
    /// How the wait ended
    pub outcome: SettleOutcome,
}

/// Everything that happened during one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Position in the step list
    pub index: usize,
    /// Step label, e.g. `navigate:/login`
    pub description: String,
    /// Action outcome
    pub outcome: StepOutcome,
    /// Page settle outcome
    pub settle: SettleOutcome,
    /// Per-frame settle outcomes, in enumeration order
    pub frames: Vec<FrameSettle>,
    /// Set when frames could not be enumerated
    pub frames_error: Option<String>,
    /// Wall time including cooldown
    pub duration_ms: u64,
}

/// How the terminal assertion ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssertionOutcome {
    /// Expected text became visible
    Visible,
    /// Expected text did not become visible in time
    NotVisible,
    /// Evaluation errored before the budget expired
    Failed {
        /// Error reported by the browser
        message: String,
    },
}

/// Errors from each release call; `None` means the call succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    /// Context close error
    pub context: Option<String>,
    /// Browser close error
    pub browser: Option<String>,
    /// Driver stop error
    pub driver: Option<String>,
}

impl TeardownReport {
    /// Check if every release call succeeded
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.context.is_none() && self.browser.is_none() && self.driver.is_none()
    }
}

/// Binary outcome exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the assertion held
    pub passed: bool,
    /// Fixed scenario message when it did not
    pub failure_reason: Option<String>,
}

/// Full record of one probe run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Unique ID for this run
    pub run_id: Uuid,
    /// Scenario that ran
    pub scenario: ScenarioId,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Total wall time
    pub duration_ms: u64,
    /// Whether the assertion held
    pub passed: bool,
    /// Fixed scenario message when it did not
    pub failure_reason: Option<String>,
    /// Per-step outcomes in execution order
    pub steps: Vec<StepReport>,
    /// Terminal assertion outcome
    pub assertion: AssertionOutcome,
    /// Release call outcomes
    pub teardown: TeardownReport,
}

impl ProbeReport {
    /// Pass/fail plus message, without the diagnostics.
    #[must_use]
    pub fn result(&self) -> ProbeResult {
        ProbeResult {
            passed: self.passed,
            failure_reason: self.failure_reason.clone(),
        }
    }

    /// Steps whose action did not complete
    #[must_use]
    pub fn tolerated_failures(&self) -> usize {
        self.steps.iter().filter(|s| !s.outcome.is_ok()).count()
    }
}
