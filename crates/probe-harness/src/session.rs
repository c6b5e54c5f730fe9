//! Probe session: one fresh browser per run, fixed steps, one assertion.
//!
//! The run is strictly sequential. Each step gets its action, a settle wait
//! on the page, a settle wait on every frame attached at that moment, and
//! a fixed cooldown, in that order. Failures inside a step are recorded and
//! the next step starts anyway. The assertion is evaluated once, after the
//! last step, and teardown always follows it.

use crate::error::{HarnessError, Result};
use crate::outcome::{
    AssertionOutcome, FrameSettle, ProbeReport, SettleOutcome, StepOutcome, StepReport,
    TeardownReport,
};
use crate::scenario::{Scenario, Step, TerminalAssertion};
use crate::timeouts::SessionTimeouts;
use probe_browser::{
    BrowserActions, BrowserError, BrowserLauncher, LaunchOptions, LoadState, WaitUntil,
};
use probe_core::BaseUrl;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Milestone every settle wait aims for.
const SETTLE_STATE: LoadState = LoadState::DomContentLoaded;

/// Runs scenarios against a target application.
///
/// The session holds only configuration; every [`ProbeSession::run`]
/// launches and tears down its own browser, so runs share no state.
pub struct ProbeSession<L> {
    launcher: L,
    launch_options: LaunchOptions,
    base_url: BaseUrl,
    timeouts: SessionTimeouts,
}

/// A step with its URL resolved and budget fixed.
#[derive(Debug)]
struct PlannedStep {
    description: String,
    action: PlannedAction,
    timeout: Duration,
}

#[derive(Debug)]
enum PlannedAction {
    Navigate(Url),
    Scroll { delta_x: f64, delta_y: f64 },
}

/// Everything validated up front, before a browser exists.
#[derive(Debug)]
struct Plan {
    steps: Vec<PlannedStep>,
    assertion: TerminalAssertion,
    assertion_timeout: Duration,
    timeouts: SessionTimeouts,
}

impl<L: BrowserLauncher> ProbeSession<L> {
    /// Create a session runner.
    pub fn new(
        launcher: L,
        launch_options: LaunchOptions,
        base_url: BaseUrl,
        timeouts: SessionTimeouts,
    ) -> Self {
        Self {
            launcher,
            launch_options,
            base_url,
            timeouts,
        }
    }

    /// Session-wide budgets before scenario overrides.
    pub fn timeouts(&self) -> &SessionTimeouts {
        &self.timeouts
    }

    /// Run one scenario.
    ///
    /// # Errors
    /// - [`HarnessError::Validation`] (or [`HarnessError::Core`] for an
    ///   unresolvable URL) if the scenario is unusable; no browser is launched
    /// - [`HarnessError::Setup`] if the browser, context or page cannot be
    ///   acquired; no step runs
    ///
    /// A failed assertion is not an error: it is a report with
    /// `passed == false` and the scenario's failure message.
    pub async fn run(&self, scenario: &Scenario) -> Result<ProbeReport> {
        let plan = self.plan(scenario)?;
        let run_id = Uuid::new_v4();
        let span = info_span!("probe", scenario = %scenario.id(), %run_id);

        self.execute(scenario, plan, run_id).instrument(span).await
    }

    fn plan(&self, scenario: &Scenario) -> Result<Plan> {
        scenario.validate()?;

        let base_url = scenario.meta.base_url.as_ref().unwrap_or(&self.base_url);
        let timeouts = self.timeouts.with_overrides(&scenario.timeouts);

        for warning in timeouts.hierarchy_warnings() {
            warn!(scenario = %scenario.id(), "{}", warning);
        }

        let steps = scenario
            .steps
            .iter()
            .map(|step| {
                let action = match step {
                    Step::Navigate { url, .. } => PlannedAction::Navigate(base_url.resolve(url)?),
                    Step::Scroll {
                        delta_x, delta_y, ..
                    } => PlannedAction::Scroll {
                        delta_x: *delta_x,
                        delta_y: *delta_y,
                    },
                };
                Ok(PlannedStep {
                    description: step.describe(),
                    action,
                    timeout: step.timeout(&timeouts),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Plan {
            steps,
            assertion_timeout: scenario.assertion.timeout(&timeouts),
            assertion: scenario.assertion.clone(),
            timeouts,
        })
    }

    async fn execute(&self, scenario: &Scenario, plan: Plan, run_id: Uuid) -> Result<ProbeReport> {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();

        info!(steps = plan.steps.len(), "starting probe");

        let options = self
            .launch_options
            .clone()
            .with_default_timeout(plan.timeouts.default);

        let mut session = self.launcher.launch(&options).await.map_err(|e| {
            error!(error = %e, "browser setup failed, no steps executed");
            HarnessError::Setup(e)
        })?;

        let steps = run_steps(&mut session, &plan).await;
        let assertion = evaluate(&mut session, &plan).await;

        let passed = assertion == AssertionOutcome::Visible;
        if passed {
            cooldown(plan.timeouts.post_assertion_cooldown).await;
        }

        let teardown = teardown(&mut session).await;

        let failure_reason = (!passed).then(|| plan.assertion.failure_message.clone());
        let report = ProbeReport {
            run_id,
            scenario: scenario.id().clone(),
            started_at,
            duration_ms: elapsed_ms(clock),
            passed,
            failure_reason,
            steps,
            assertion,
            teardown,
        };

        info!(
            passed = report.passed,
            tolerated_failures = report.tolerated_failures(),
            duration_ms = report.duration_ms,
            "probe finished"
        );

        Ok(report)
    }
}

async fn run_steps<S: BrowserActions>(session: &mut S, plan: &Plan) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(plan.steps.len());
    let mut first_navigation = true;

    for (index, step) in plan.steps.iter().enumerate() {
        let clock = Instant::now();
        debug!(step = index, action = %step.description, "executing step");

        let outcome = match &step.action {
            PlannedAction::Navigate(url) => {
                let wait_until = if first_navigation {
                    WaitUntil::Commit
                } else {
                    WaitUntil::Load
                };
                first_navigation = false;
                navigation_outcome(session.navigate(url.as_str(), wait_until, step.timeout).await)
            }
            PlannedAction::Scroll { delta_x, delta_y } => interaction_outcome(
                session
                    .mouse_wheel(*delta_x, *delta_y, step.timeout)
                    .await,
            ),
        };

        if !outcome.is_ok() {
            warn!(step = index, action = %step.description, ?outcome, "step action tolerated failure");
        }

        let settle = settle_outcome(
            session
                .wait_for_load_state(SETTLE_STATE, plan.timeouts.settle)
                .await,
        );
        if settle != SettleOutcome::Settled {
            debug!(step = index, ?settle, "page did not settle");
        }

        let (frames, frames_error) = settle_frames(session, plan.timeouts.settle).await;

        cooldown(plan.timeouts.step_cooldown).await;

        reports.push(StepReport {
            index,
            description: step.description.clone(),
            outcome,
            settle,
            frames,
            frames_error,
            duration_ms: elapsed_ms(clock),
        });
    }

    reports
}

/// Settle every frame attached right now; one frame's failure never skips another.
async fn settle_frames<S: BrowserActions>(
    session: &mut S,
    budget: Duration,
) -> (Vec<FrameSettle>, Option<String>) {
    let frames = match session.frames().await {
        Ok(frames) => frames,
        Err(e) => {
            debug!(error = %e, "frame enumeration failed");
            return (Vec::new(), Some(e.to_string()));
        }
    };

    let mut settled = Vec::with_capacity(frames.len());
    for frame in frames {
        let outcome = settle_outcome(
            session
                .wait_for_frame_load_state(&frame, SETTLE_STATE, budget)
                .await,
        );
        if outcome != SettleOutcome::Settled {
            debug!(frame = %frame.id, url = %frame.url, ?outcome, "frame did not settle");
        }
        settled.push(FrameSettle { frame, outcome });
    }

    (settled, None)
}

async fn evaluate<S: BrowserActions>(session: &mut S, plan: &Plan) -> AssertionOutcome {
    let text = &plan.assertion.text;
    debug!(text = %text, timeout_ms = ?plan.assertion_timeout, "evaluating assertion");

    match session
        .expect_text_visible(text, plan.assertion_timeout)
        .await
    {
        Ok(()) => AssertionOutcome::Visible,
        Err(e) if e.is_timeout() => {
            info!(text = %text, "expected text not visible");
            AssertionOutcome::NotVisible
        }
        Err(e) => {
            warn!(text = %text, error = %e, "assertion evaluation failed");
            AssertionOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Context, then browser, then driver; each attempted regardless of the others.
async fn teardown<S: BrowserActions>(session: &mut S) -> TeardownReport {
    let context = session.close_context().await.err().map(|e| {
        warn!(error = %e, "failed to close context");
        e.to_string()
    });
    let browser = session.close_browser().await.err().map(|e| {
        warn!(error = %e, "failed to close browser");
        e.to_string()
    });
    let driver = session.stop_driver().await.err().map(|e| {
        warn!(error = %e, "failed to stop driver");
        e.to_string()
    });

    TeardownReport {
        context,
        browser,
        driver,
    }
}

fn navigation_outcome(result: std::result::Result<(), BrowserError>) -> StepOutcome {
    match result {
        Ok(()) => StepOutcome::Ok,
        Err(e) if e.is_timeout() => StepOutcome::TimedOut,
        Err(e) => StepOutcome::NavigationError {
            message: e.to_string(),
        },
    }
}

fn interaction_outcome(result: std::result::Result<(), BrowserError>) -> StepOutcome {
    match result {
        Ok(()) => StepOutcome::Ok,
        Err(e) if e.is_timeout() => StepOutcome::TimedOut,
        Err(e) => StepOutcome::InteractionError {
            message: e.to_string(),
        },
    }
}

fn settle_outcome(result: std::result::Result<(), BrowserError>) -> SettleOutcome {
    match result {
        Ok(()) => SettleOutcome::Settled,
        Err(e) if e.is_timeout() => SettleOutcome::TimedOut,
        Err(e) => SettleOutcome::Failed {
            message: e.to_string(),
        },
    }
}

async fn cooldown(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}
