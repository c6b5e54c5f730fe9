use probe_core::BrowserSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Launch configuration for one probe session
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub disable_dev_shm_usage: bool,
    pub single_process: bool,
    pub no_sandbox: bool,
    pub chrome_executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
    /// Context default timeout for interactions and teardown calls
    pub default_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_settings(&BrowserSettings::default(), Duration::from_millis(5_000))
    }
}

impl LaunchOptions {
    pub fn from_settings(settings: &BrowserSettings, default_timeout: Duration) -> Self {
        Self {
            headless: settings.headless,
            viewport_width: settings.viewport_width,
            viewport_height: settings.viewport_height,
            disable_dev_shm_usage: settings.disable_dev_shm_usage,
            single_process: settings.single_process,
            no_sandbox: settings.no_sandbox,
            chrome_executable: settings.chrome_executable.clone(),
            extra_args: settings.extra_args.clone(),
            default_timeout,
        }
    }

    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Command-line switches passed to Chrome.
    ///
    /// Headless and sandbox flags are applied by the launcher itself.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![format!(
            "--window-size={},{}",
            self.viewport_width, self.viewport_height
        )];

        if self.disable_dev_shm_usage {
            args.push("--disable-dev-shm-usage".to_string());
        }
        if self.single_process {
            args.push("--single-process".to_string());
        }

        for arg in &self.extra_args {
            if !args.contains(arg) {
                args.push(arg.clone());
            }
        }

        args
    }
}
