//! Scenario definitions: the data that parameterizes one probe.
//!
//! A scenario is a fixed step list, one terminal assertion, and optional
//! timeout overrides. Scenarios are loaded from TOML files or built in code
//! with [`ScenarioBuilder`]; both paths go through [`Scenario::validate`].

use crate::error::{HarnessError, Result};
use crate::timeouts::{SessionTimeouts, TimeoutOverrides};
use probe_core::{BaseUrl, ScenarioId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete scenario definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Identity and target metadata
    #[serde(rename = "scenario")]
    pub meta: ScenarioMeta,

    /// Per-scenario budget overrides
    #[serde(default)]
    pub timeouts: TimeoutOverrides,

    /// Steps in execution order
    pub steps: Vec<Step>,

    /// The single pass/fail check
    pub assertion: TerminalAssertion,
}

/// Scenario identity and target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    /// Unique scenario identifier (e.g., "token-refresh")
    pub id: ScenarioId,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// What the scenario tries to confirm
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Base URL overriding the configured target
    #[serde(default)]
    pub base_url: Option<BaseUrl>,
}

/// Whether a step moves the page or acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Loads a URL
    Navigate,
    /// Acts on the current page
    Interact,
}

/// One browser action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL, absolute or relative to the base URL
    Navigate {
        /// Target path or URL
        url: String,
        /// Navigation budget; the session navigation timeout when unset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Dispatch a mouse wheel event
    Scroll {
        /// Horizontal wheel delta
        #[serde(default)]
        delta_x: f64,
        /// Vertical wheel delta
        #[serde(default)]
        delta_y: f64,
        /// Interaction budget; the context default timeout when unset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

impl Step {
    /// Navigate or interact.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Navigate { .. } => StepKind::Navigate,
            Self::Scroll { .. } => StepKind::Interact,
        }
    }

    /// Budget for the step's action.
    #[must_use]
    pub fn timeout(&self, timeouts: &SessionTimeouts) -> Duration {
        match self {
            Self::Navigate { timeout_ms, .. } => {
                timeout_ms.map_or(timeouts.navigation, Duration::from_millis)
            }
            Self::Scroll { timeout_ms, .. } => {
                timeout_ms.map_or(timeouts.default, Duration::from_millis)
            }
        }
    }

    /// Short label used in logs and reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Navigate { url, .. } => format!("navigate:{url}"),
            Self::Scroll {
                delta_x, delta_y, ..
            } => format!("scroll:{delta_x},{delta_y}"),
        }
    }

    fn timeout_ms(&self) -> Option<u64> {
        match self {
            Self::Navigate { timeout_ms, .. } | Self::Scroll { timeout_ms, .. } => *timeout_ms,
        }
    }
}

/// Expected visible text evaluated once after all steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalAssertion {
    /// Text an element must visibly contain
    pub text: String,

    /// Assertion budget; the session assertion timeout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Fixed message reported when the text never becomes visible
    pub failure_message: String,
}

impl TerminalAssertion {
    /// Budget for the assertion.
    #[must_use]
    pub fn timeout(&self, timeouts: &SessionTimeouts) -> Duration {
        self.timeout_ms
            .map_or(timeouts.assertion, Duration::from_millis)
    }
}

impl Scenario {
    /// Start building a scenario in code.
    #[must_use]
    pub fn builder(id: ScenarioId) -> ScenarioBuilder {
        ScenarioBuilder::new(id)
    }

    /// Get the scenario ID.
    #[must_use]
    pub fn id(&self) -> &ScenarioId {
        &self.meta.id
    }

    /// Name for display, falling back to the ID.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.meta.name.is_empty() {
            self.meta.id.as_str()
        } else {
            &self.meta.name
        }
    }

    /// Whether the scenario carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.meta.tags.iter().any(|t| t == tag)
    }

    /// Validate the scenario for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        let id = self.id();

        if self.steps.is_empty() {
            return Err(HarnessError::invalid(id, "step list is empty"));
        }

        for (index, step) in self.steps.iter().enumerate() {
            if step.timeout_ms() == Some(0) {
                return Err(HarnessError::invalid(
                    id,
                    format!("step {index} has a zero timeout"),
                ));
            }
            if let Step::Navigate { url, .. } = step {
                if url.trim().is_empty() {
                    return Err(HarnessError::invalid(
                        id,
                        format!("step {index} has an empty URL"),
                    ));
                }
            }
        }

        if self.assertion.text.trim().is_empty() {
            return Err(HarnessError::invalid(id, "assertion text cannot be empty"));
        }

        if self.assertion.failure_message.trim().is_empty() {
            return Err(HarnessError::invalid(
                id,
                "assertion failure message cannot be empty",
            ));
        }

        if self.assertion.timeout_ms == Some(0) {
            return Err(HarnessError::invalid(id, "assertion has a zero timeout"));
        }

        let zero = self.timeouts.zero_budgets();
        if !zero.is_empty() {
            return Err(HarnessError::invalid(
                id,
                format!("timeouts must be greater than zero: {}", zero.join(", ")),
            ));
        }

        Ok(())
    }
}

/// Builder for scenarios defined in code.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    meta: ScenarioMeta,
    timeouts: TimeoutOverrides,
    steps: Vec<Step>,
    assertion: Option<TerminalAssertion>,
}

impl ScenarioBuilder {
    /// Create a builder with no steps.
    #[must_use]
    pub fn new(id: ScenarioId) -> Self {
        Self {
            meta: ScenarioMeta {
                id,
                name: String::new(),
                description: String::new(),
                tags: Vec::new(),
                base_url: None,
            },
            timeouts: TimeoutOverrides::default(),
            steps: Vec::new(),
            assertion: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.meta.name = name.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = description.into();
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.meta.tags.push(tag.into());
        self
    }

    /// Override the configured base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.meta.base_url = Some(base_url);
        self
    }

    /// Override session budgets for this scenario.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutOverrides) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Append a navigation using the session navigation timeout.
    #[must_use]
    pub fn navigate(mut self, url: impl Into<String>) -> Self {
        self.steps.push(Step::Navigate {
            url: url.into(),
            timeout_ms: None,
        });
        self
    }

    /// Append a navigation with its own timeout.
    #[must_use]
    pub fn navigate_within(mut self, url: impl Into<String>, timeout: Duration) -> Self {
        self.steps.push(Step::Navigate {
            url: url.into(),
            timeout_ms: Some(duration_ms(timeout)),
        });
        self
    }

    /// Append a mouse wheel scroll using the context default timeout.
    #[must_use]
    pub fn scroll(mut self, delta_x: f64, delta_y: f64) -> Self {
        self.steps.push(Step::Scroll {
            delta_x,
            delta_y,
            timeout_ms: None,
        });
        self
    }

    /// Set the terminal assertion.
    #[must_use]
    pub fn expect_visible(
        mut self,
        text: impl Into<String>,
        timeout: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        self.assertion = Some(TerminalAssertion {
            text: text.into(),
            timeout_ms: Some(duration_ms(timeout)),
            failure_message: failure_message.into(),
        });
        self
    }

    /// Validate and produce the scenario.
    pub fn build(self) -> Result<Scenario> {
        let assertion = self
            .assertion
            .ok_or_else(|| HarnessError::invalid(&self.meta.id, "no terminal assertion"))?;

        let scenario = Scenario {
            meta: self.meta,
            timeouts: self.timeouts,
            steps: self.steps,
            assertion,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
