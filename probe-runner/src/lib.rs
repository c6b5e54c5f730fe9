//! Probe runner shell.
//!
//! Parses arguments, loads configuration and the scenario catalogue, and
//! hands the selected scenarios to the harness. Probe logic lives in the
//! `crates/` directory.

pub mod error;

use clap::Parser;
use error::{RunnerError, EXIT_FAILED, EXIT_PASSED};
use probe_browser::{ChromiumLauncher, LaunchOptions};
use probe_core::{HarnessConfig, ScenarioId};
use probe_harness::{
    HarnessError, ProbeSession, Scenario, ScenarioLoader, ScenarioRegistry, ScenarioStatus,
    SessionTimeouts, SuiteReport, SuiteRunner,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "probe-runner")]
#[command(about = "Run browser probe scenarios against a web application")]
#[command(version)]
pub struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scenario directory (overrides the configured one)
    #[arg(short, long)]
    pub scenarios: Option<PathBuf>,

    /// Run only this scenario; repeat for several
    #[arg(long = "scenario", value_name = "ID")]
    pub scenario_ids: Vec<String>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Base URL of the application under probe
    #[arg(long, env = "PROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Print the suite report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,probe=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Configuration with file, environment and argument overrides applied.
pub fn load_config(args: &Args) -> Result<HarnessConfig, RunnerError> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = HarnessConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config
        }
        None => HarnessConfig::load_with_env()?,
    };

    if let Some(base_url) = &args.base_url {
        config.target.base_url.clone_from(base_url);
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(dir) = &args.scenarios {
        config.scenarios.dir.clone_from(dir);
    }

    config.validate()?;
    Ok(config)
}

/// Open the scenario directory, searching from the workspace root when the
/// configured relative path does not exist here.
pub fn open_loader(args: &Args, config: &HarnessConfig) -> Result<ScenarioLoader, RunnerError> {
    match ScenarioLoader::new(config.scenarios.dir.clone()) {
        Ok(loader) => Ok(loader),
        Err(HarnessError::DirectoryNotFound { .. })
            if args.scenarios.is_none() && config.scenarios.dir.is_relative() =>
        {
            debug!(dir = %config.scenarios.dir.display(), "scenario dir not found, searching workspace root");
            Ok(ScenarioLoader::with_default_dir()?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Scenarios to run, in ID order unless named explicitly.
pub fn select_scenarios(
    registry: &ScenarioRegistry,
    args: &Args,
) -> Result<Vec<Scenario>, RunnerError> {
    let mut selected = if args.scenario_ids.is_empty() {
        registry.get_all()
    } else {
        args.scenario_ids
            .iter()
            .map(|raw| {
                let id = ScenarioId::new(raw.as_str()).map_err(HarnessError::from)?;
                Ok(registry.get(&id)?)
            })
            .collect::<Result<Vec<_>, RunnerError>>()?
    };

    if let Some(tag) = &args.tag {
        selected.retain(|s| s.has_tag(tag));
    }

    if selected.is_empty() {
        return Err(RunnerError::NoScenarios);
    }

    Ok(selected)
}

/// Load everything and run the selected scenarios against Chrome.
pub async fn run(args: &Args) -> Result<SuiteReport, RunnerError> {
    let config = load_config(args)?;
    let base_url = config.base_url()?;

    let loader = open_loader(args, &config)?;
    let registry = ScenarioRegistry::load_from(&loader)?;
    let scenarios = select_scenarios(&registry, args)?;

    info!(
        target_url = %base_url.as_url(),
        scenarios = scenarios.len(),
        headless = config.browser.headless,
        "starting probe run"
    );

    let session = ProbeSession::new(
        ChromiumLauncher,
        LaunchOptions::from_settings(&config.browser, config.timeouts.default_timeout()),
        base_url,
        SessionTimeouts::from(&config.timeouts),
    );

    Ok(SuiteRunner::new(session).run(&scenarios).await)
}

/// Exit code for a finished suite.
#[must_use]
pub fn exit_code(report: &SuiteReport) -> u8 {
    if report.all_passed() {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    }
}

/// Write the suite report as JSON or as one line per scenario.
pub fn print_report(report: &SuiteReport, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        return Ok(());
    }

    for result in &report.results {
        match &result.status {
            ScenarioStatus::Passed => {
                let ms = result.report.as_ref().map_or(0, |r| r.duration_ms);
                writeln!(out, "PASS  {} ({}ms)", result.scenario, ms)?;
            }
            ScenarioStatus::Failed { reason } => {
                writeln!(out, "FAIL  {}: {}", result.scenario, reason)?;
            }
            ScenarioStatus::Errored { error } => {
                writeln!(out, "ERROR {}: {}", result.scenario, error)?;
            }
        }
    }

    writeln!(
        out,
        "{} total, {} passed, {} failed, {} errored in {}ms",
        report.total, report.passed, report.failed, report.errored, report.duration_ms
    )?;

    Ok(())
}
