//! Timeout budgets for one probe run.

use probe_core::TimeoutConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolved budgets for a probe session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Context default timeout, used for interactions without their own budget
    pub default: Duration,
    /// Navigation timeout for steps without their own budget
    pub navigation: Duration,
    /// Settle wait per page and per frame
    pub settle: Duration,
    /// Assertion timeout when the assertion has none
    pub assertion: Duration,
    /// Fixed delay after every step
    pub step_cooldown: Duration,
    /// Fixed delay after a passing assertion
    pub post_assertion_cooldown: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for SessionTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            default: config.default_timeout(),
            navigation: config.navigation(),
            settle: config.settle(),
            assertion: config.assertion(),
            step_cooldown: config.step_cooldown(),
            post_assertion_cooldown: config.post_assertion_cooldown(),
        }
    }
}

impl SessionTimeouts {
    /// No cooldowns; useful when pacing is handled elsewhere.
    #[must_use]
    pub fn without_cooldowns(mut self) -> Self {
        self.step_cooldown = Duration::ZERO;
        self.post_assertion_cooldown = Duration::ZERO;
        self
    }

    /// Apply per-scenario overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &TimeoutOverrides) -> Self {
        let ms = Duration::from_millis;
        if let Some(v) = overrides.default_ms {
            self.default = ms(v);
        }
        if let Some(v) = overrides.navigation_ms {
            self.navigation = ms(v);
        }
        if let Some(v) = overrides.settle_ms {
            self.settle = ms(v);
        }
        if let Some(v) = overrides.assertion_ms {
            self.assertion = ms(v);
        }
        if let Some(v) = overrides.step_cooldown_ms {
            self.step_cooldown = ms(v);
        }
        if let Some(v) = overrides.post_assertion_cooldown_ms {
            self.post_assertion_cooldown = ms(v);
        }
        self
    }

    /// Budgets that break the expected ordering
    /// (navigation > settle >= cooldown, interactions shorter than navigation).
    #[must_use]
    pub fn hierarchy_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.settle >= self.navigation {
            warnings.push(format!(
                "settle budget {:?} is not shorter than navigation {:?}",
                self.settle, self.navigation
            ));
        }
        if self.step_cooldown > self.settle {
            warnings.push(format!(
                "step cooldown {:?} exceeds settle budget {:?}",
                self.step_cooldown, self.settle
            ));
        }
        if self.default >= self.navigation {
            warnings.push(format!(
                "interaction timeout {:?} is not shorter than navigation {:?}",
                self.default, self.navigation
            ));
        }
        warnings
    }
}

/// Optional per-scenario budget overrides, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct TimeoutOverrides {
    pub default_ms: Option<u64>,
    pub navigation_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub assertion_ms: Option<u64>,
    pub step_cooldown_ms: Option<u64>,
    pub post_assertion_cooldown_ms: Option<u64>,
}

impl TimeoutOverrides {
    /// Names of budgets overridden to zero; cooldowns are allowed to be zero.
    pub(crate) fn zero_budgets(&self) -> Vec<&'static str> {
        [
            ("default_ms", self.default_ms),
            ("navigation_ms", self.navigation_ms),
            ("settle_ms", self.settle_ms),
            ("assertion_ms", self.assertion_ms),
        ]
        .into_iter()
        .filter(|(_, v)| *v == Some(0))
        .map(|(name, _)| name)
        .collect()
    }
}
