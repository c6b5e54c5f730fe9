//! Configuration management for the probe harness.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::BaseUrl;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main harness configuration.
///
/// This is loaded from `~/.config/probe/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Application under probe
    pub target: TargetConfig,
    /// Browser launch settings
    pub browser: BrowserSettings,
    /// Timeout budgets and pacing
    pub timeouts: TimeoutConfig,
    /// Scenario catalogue location
    pub scenarios: ScenarioSettings,
}

impl HarnessConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`HarnessConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PROBE_BASE_URL`: Override the target base URL
    /// - `PROBE_HEADLESS`: Override browser headless mode (true/false)
    /// - `PROBE_SCENARIOS_DIR`: Override the scenario directory
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("PROBE_BASE_URL") {
            tracing::debug!("Override target.base_url from env: {}", val);
            self.target.base_url = val;
        }

        if let Some(val) = lookup("PROBE_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("PROBE_SCENARIOS_DIR") {
            tracing::debug!("Override scenarios.dir from env: {}", val);
            self.scenarios.dir = PathBuf::from(val);
        }
    }

    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        self.base_url()?;

        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.viewport".to_string(),
                reason: format!(
                    "dimensions must be non-zero, got {}x{}",
                    self.browser.viewport_width, self.browser.viewport_height
                ),
            });
        }

        self.timeouts.validate()
    }

    /// Parsed base URL of the target application.
    pub fn base_url(&self) -> ConfigResult<BaseUrl> {
        BaseUrl::parse(&self.target.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "target.base_url".to_string(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/probe/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("dev", "probe", "probe").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Application under probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL every scenario path is resolved against
    pub base_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Browser launch settings.
///
/// Defaults are headless and container-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BrowserSettings {
    /// Run browser in headless mode
    pub headless: bool,
    /// Fixed viewport width
    pub viewport_width: u32,
    /// Fixed viewport height
    pub viewport_height: u32,
    /// Pass `--disable-dev-shm-usage`
    pub disable_dev_shm_usage: bool,
    /// Pass `--single-process`
    pub single_process: bool,
    /// Pass `--no-sandbox` (needed when running as root in containers)
    pub no_sandbox: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,
    /// Additional command-line switches
    pub extra_args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            disable_dev_shm_usage: true,
            single_process: true,
            no_sandbox: false,
            chrome_executable: None,
            extra_args: Vec::new(),
        }
    }
}

/// Timeout budgets and fixed pacing, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Context default timeout for UI interactions
    pub default_ms: u64,
    /// Navigation timeout when a step does not set its own
    pub navigation_ms: u64,
    /// Settle wait budget per page and per frame
    pub settle_ms: u64,
    /// Terminal assertion timeout when a scenario does not set its own
    pub assertion_ms: u64,
    /// Fixed delay after each step
    pub step_cooldown_ms: u64,
    /// Fixed delay after a passing assertion
    pub post_assertion_cooldown_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: 5_000,
            navigation_ms: 10_000,
            settle_ms: 3_000,
            assertion_ms: 5_000,
            step_cooldown_ms: 3_000,
            post_assertion_cooldown_ms: 5_000,
        }
    }
}

impl TimeoutConfig {
    /// Reject zero budgets; cooldowns may be zero.
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("timeouts.default_ms", self.default_ms),
            ("timeouts.navigation_ms", self.navigation_ms),
            ("timeouts.settle_ms", self.settle_ms),
            ("timeouts.assertion_ms", self.assertion_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Context default timeout.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    /// Navigation timeout.
    #[must_use]
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Settle wait budget.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Assertion timeout.
    #[must_use]
    pub fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    /// Inter-step cooldown.
    #[must_use]
    pub fn step_cooldown(&self) -> Duration {
        Duration::from_millis(self.step_cooldown_ms)
    }

    /// Post-assertion cooldown.
    #[must_use]
    pub fn post_assertion_cooldown(&self) -> Duration {
        Duration::from_millis(self.post_assertion_cooldown_ms)
    }
}

/// Scenario catalogue location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    /// Directory searched recursively for `*.toml` scenario files
    pub dir: PathBuf,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("scenarios"),
        }
    }
}
