mod common;

use common::{frame, Call, FakeLauncher, Script};
use probe_browser::WaitUntil;
use probe_core::{BaseUrl, ScenarioId};
use probe_harness::{
    AssertionOutcome, HarnessError, Scenario, ScenarioMeta, SessionTimeouts, SettleOutcome,
    StepOutcome, TerminalAssertion, TimeoutOverrides,
};
use std::time::Duration;

const TOKEN_MESSAGE: &str = "new access token issuance not confirmed";

fn token_refresh() -> Scenario {
    Scenario::builder(ScenarioId::new("token-refresh").expect("valid scenario ID"))
        .navigate("/api/auth/refresh-token")
        .navigate("/api-docs")
        .navigate("/api/auth/refresh-token")
        .navigate("/api/auth/login")
        .navigate("/")
        .expect_visible(
            "Refresh Token Expired",
            Duration::from_millis(1000),
            TOKEN_MESSAGE,
        )
        .build()
        .expect("build token-refresh scenario")
}

fn accept_call() -> Scenario {
    Scenario::builder(ScenarioId::new("accept-call").expect("valid scenario ID"))
        .navigate("/api/v1/calls/validRingingCallId/accept")
        .navigate("/login")
        .scroll(0.0, 300.0)
        .expect_visible(
            "Call Accepted Successfully",
            Duration::from_millis(30_000),
            "ringing call was not accepted",
        )
        .build()
        .expect("build accept-call scenario")
}

fn assert_teardown_last(calls: &[Call]) {
    let teardown: Vec<_> = calls.iter().filter(|c| c.is_teardown()).cloned().collect();
    assert_eq!(
        teardown,
        vec![Call::CloseContext, Call::CloseBrowser, Call::StopDriver]
    );
    assert_eq!(&calls[calls.len() - 3..], teardown.as_slice());
}

#[tokio::test]
async fn test_token_refresh_fails_with_fixed_message() {
    let launcher = FakeLauncher::new(Script::default());
    let report = common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    assert!(!report.passed);
    assert_eq!(report.failure_reason.as_deref(), Some(TOKEN_MESSAGE));
    assert_eq!(report.assertion, AssertionOutcome::NotVisible);
    assert_eq!(report.steps.len(), 5);

    let paths: Vec<_> = launcher.navigations().into_iter().map(|(p, _)| p).collect();
    assert_eq!(
        paths,
        vec![
            "/api/auth/refresh-token",
            "/api-docs",
            "/api/auth/refresh-token",
            "/api/auth/login",
            "/",
        ]
    );

    let result = report.result();
    assert!(!result.passed);
    assert_eq!(result.failure_reason.as_deref(), Some(TOKEN_MESSAGE));
}

#[tokio::test]
async fn test_accept_call_passes_when_text_visible() {
    let launcher = FakeLauncher::new(Script::showing("Call Accepted Successfully"));
    let report = common::session(&launcher)
        .run(&accept_call())
        .await
        .expect("probe runs");

    assert!(report.passed);
    assert_eq!(report.failure_reason, None);
    assert_eq!(report.assertion, AssertionOutcome::Visible);
    assert!(report.teardown.is_clean());

    let calls = launcher.calls();
    assert!(calls.contains(&Call::ExpectVisible {
        text: "Call Accepted Successfully".to_string(),
        timeout: Duration::from_millis(30_000),
    }));
    let wheel = calls
        .iter()
        .find(|c| matches!(c, Call::Wheel { .. }))
        .expect("scroll dispatched");
    assert_eq!(
        wheel,
        &Call::Wheel {
            delta_x: 0.0,
            delta_y: 300.0,
            timeout: Duration::from_millis(5_000),
        }
    );
}

#[tokio::test]
async fn test_only_first_navigation_waits_for_commit() {
    let launcher = FakeLauncher::new(Script::default());
    common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    let modes: Vec<_> = launcher.navigations().into_iter().map(|(_, w)| w).collect();
    assert_eq!(modes[0], WaitUntil::Commit);
    assert!(modes[1..].iter().all(|w| *w == WaitUntil::Load));
}

#[tokio::test]
async fn test_steps_run_in_order_without_interleaving() {
    let launcher = FakeLauncher::new(Script {
        frames: vec![frame("main", true), frame("ad", false)],
        ..Script::default()
    });
    common::session(&launcher)
        .run(&accept_call())
        .await
        .expect("probe runs");

    let calls = launcher.calls();
    let starts: Vec<_> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_action())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(starts.len(), 3);

    // Every step is action, page settle, enumeration, one wait per frame
    for start in starts {
        assert!(matches!(calls[start + 1], Call::PageSettle { .. }));
        assert_eq!(calls[start + 2], Call::Frames);
        assert_eq!(
            calls[start + 3],
            Call::FrameSettle {
                id: "main".to_string()
            }
        );
        assert_eq!(
            calls[start + 4],
            Call::FrameSettle {
                id: "ad".to_string()
            }
        );
    }
}

#[tokio::test]
async fn test_assertion_runs_once_after_all_steps() {
    let launcher = FakeLauncher::new(Script::default());
    common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    let calls = launcher.calls();
    let assertions: Vec<_> = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Call::ExpectVisible { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(assertions.len(), 1);

    let last_step_call = calls
        .iter()
        .rposition(|c| matches!(c, Call::FrameSettle { .. }))
        .expect("frames settled");
    let first_teardown = calls
        .iter()
        .position(Call::is_teardown)
        .expect("teardown ran");
    assert!(last_step_call < assertions[0]);
    assert!(assertions[0] < first_teardown);
}

#[tokio::test]
async fn test_teardown_once_in_order_after_failures() {
    let launcher = FakeLauncher::new(Script {
        unreachable: vec!["/api/auth/refresh-token"],
        slow: vec!["/api-docs"],
        page_never_settles: true,
        teardown_fails: true,
        ..Script::default()
    });
    let report = common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    assert!(!report.passed);
    assert_teardown_last(&launcher.calls());
    assert!(report.teardown.context.is_some());
    assert!(report.teardown.browser.is_some());
    assert!(report.teardown.driver.is_some());
}

#[tokio::test]
async fn test_teardown_after_passing_assertion() {
    let launcher = FakeLauncher::new(Script::showing("Call Accepted Successfully"));
    common::session(&launcher)
        .run(&accept_call())
        .await
        .expect("probe runs");

    assert_teardown_last(&launcher.calls());
}

#[tokio::test]
async fn test_step_failures_are_tolerated_and_tagged() {
    let launcher = FakeLauncher::new(Script {
        unreachable: vec!["/api/auth/refresh-token"],
        slow: vec!["/api-docs"],
        page_never_settles: true,
        ..Script::default()
    });
    let report = common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    let outcomes: Vec<_> = report.steps.iter().map(|s| s.outcome.clone()).collect();
    assert!(matches!(outcomes[0], StepOutcome::NavigationError { .. }));
    assert_eq!(outcomes[1], StepOutcome::TimedOut);
    assert!(matches!(outcomes[2], StepOutcome::NavigationError { .. }));
    assert_eq!(outcomes[3], StepOutcome::Ok);
    assert_eq!(outcomes[4], StepOutcome::Ok);
    assert_eq!(report.tolerated_failures(), 3);

    assert!(report
        .steps
        .iter()
        .all(|s| s.settle == SettleOutcome::TimedOut));
    assert_eq!(launcher.count(Call::is_navigate), 5);
}

#[tokio::test]
async fn test_scroll_failure_is_interaction_error() {
    let launcher = FakeLauncher::new(Script {
        wheel_fails: true,
        ..Script::showing("Call Accepted Successfully")
    });
    let report = common::session(&launcher)
        .run(&accept_call())
        .await
        .expect("probe runs");

    assert!(matches!(
        report.steps[2].outcome,
        StepOutcome::InteractionError { .. }
    ));
    assert!(report.passed);
}

#[tokio::test]
async fn test_frame_timeout_does_not_skip_siblings() {
    let launcher = FakeLauncher::new(Script {
        frames: vec![frame("main", true), frame("chat", false), frame("ads", false)],
        stuck_frames: vec!["chat"],
        ..Script::default()
    });
    let report = common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    for step in &report.steps {
        let outcomes: Vec<_> = step.frames.iter().map(|f| f.outcome.clone()).collect();
        assert_eq!(
            outcomes,
            vec![
                SettleOutcome::Settled,
                SettleOutcome::TimedOut,
                SettleOutcome::Settled
            ]
        );
    }
    assert_eq!(
        launcher.count(|c| matches!(c, Call::FrameSettle { .. })),
        3 * report.steps.len()
    );
}

#[tokio::test]
async fn test_frame_enumeration_failure_is_recorded() {
    let launcher = FakeLauncher::new(Script {
        frames_unavailable: true,
        ..Script::default()
    });
    let report = common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    assert_eq!(report.steps.len(), 5);
    for step in &report.steps {
        assert!(step.frames.is_empty());
        assert!(step.frames_error.is_some());
    }
}

#[tokio::test]
async fn test_assertion_error_reports_fixed_message() {
    let launcher = FakeLauncher::new(Script {
        assertion_errors: true,
        ..Script::default()
    });
    let report = common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    assert!(!report.passed);
    assert!(matches!(report.assertion, AssertionOutcome::Failed { .. }));
    assert_eq!(report.failure_reason.as_deref(), Some(TOKEN_MESSAGE));
}

#[tokio::test]
async fn test_setup_failure_runs_no_steps() {
    let launcher = FakeLauncher::new(Script {
        launch_fails: true,
        ..Script::default()
    });
    let result = common::session(&launcher).run(&token_refresh()).await;

    assert!(matches!(result, Err(HarnessError::Setup(_))));
    assert_eq!(
        launcher.calls(),
        vec![Call::Launch {
            default_timeout: Duration::from_millis(5_000)
        }]
    );
}

#[tokio::test]
async fn test_empty_step_list_rejected_before_launch() {
    let scenario = Scenario {
        meta: ScenarioMeta {
            id: ScenarioId::new("empty-steps").expect("valid scenario ID"),
            name: String::new(),
            description: String::new(),
            tags: Vec::new(),
            base_url: None,
        },
        timeouts: TimeoutOverrides::default(),
        steps: Vec::new(),
        assertion: TerminalAssertion {
            text: "anything".to_string(),
            timeout_ms: None,
            failure_message: "never checked".to_string(),
        },
    };

    let launcher = FakeLauncher::new(Script::default());
    let result = common::session(&launcher).run(&scenario).await;

    assert!(matches!(result, Err(HarnessError::Validation { .. })));
    assert!(launcher.calls().is_empty());
}

#[tokio::test]
async fn test_off_host_step_rejected_before_launch() {
    for target in ["https://elsewhere.test/health", "//elsewhere.test/health"] {
        let scenario = Scenario::builder(ScenarioId::new("off-host").expect("valid scenario ID"))
            .navigate("/status")
            .navigate(target)
            .expect_visible("ok", Duration::from_secs(1), "not ok")
            .build()
            .expect("build scenario");

        let launcher = FakeLauncher::new(Script::default());
        let result = common::session(&launcher).run(&scenario).await;

        assert!(matches!(result, Err(HarnessError::Core(_))), "{target}");
        assert!(launcher.calls().is_empty(), "{target}");
    }
}

#[tokio::test]
async fn test_budgets_reach_the_browser() {
    let launcher = FakeLauncher::new(Script::default());
    common::session(&launcher)
        .run(&token_refresh())
        .await
        .expect("probe runs");

    let calls = launcher.calls();
    assert_eq!(
        calls[0],
        Call::Launch {
            default_timeout: Duration::from_millis(5_000)
        }
    );
    for call in &calls {
        match call {
            Call::Navigate { timeout, .. } => assert_eq!(*timeout, Duration::from_millis(10_000)),
            Call::PageSettle { timeout } => assert_eq!(*timeout, Duration::from_millis(3_000)),
            Call::ExpectVisible { timeout, .. } => {
                assert_eq!(*timeout, Duration::from_millis(1_000));
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_scenario_overrides_apply() {
    let scenario = Scenario::builder(ScenarioId::new("override-me").expect("valid scenario ID"))
        .base_url(BaseUrl::parse("http://other.test").expect("valid base URL"))
        .timeouts(TimeoutOverrides {
            navigation_ms: Some(2_000),
            default_ms: Some(1_500),
            ..TimeoutOverrides::default()
        })
        .navigate("/status")
        .navigate_within("http://other.test/health", Duration::from_millis(700))
        .expect_visible("ok", Duration::from_secs(1), "not ok")
        .build()
        .expect("build scenario");

    let launcher = FakeLauncher::new(Script::default());
    common::session(&launcher)
        .run(&scenario)
        .await
        .expect("probe runs");

    let calls = launcher.calls();
    assert_eq!(
        calls[0],
        Call::Launch {
            default_timeout: Duration::from_millis(1_500)
        }
    );
    let navigations: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Navigate { path, timeout, .. } => Some((path.clone(), *timeout)),
            _ => None,
        })
        .collect();
    assert_eq!(
        navigations,
        vec![
            ("http://other.test/status".to_string(), Duration::from_millis(2_000)),
            ("http://other.test/health".to_string(), Duration::from_millis(700)),
        ]
    );
}

#[tokio::test]
async fn test_repeated_runs_are_independent() {
    let launcher = FakeLauncher::new(Script::default());
    let session = common::session(&launcher);
    let scenario = token_refresh();

    let first = session.run(&scenario).await.expect("first run");
    let first_calls = launcher.calls();
    launcher.clear();
    let second = session.run(&scenario).await.expect("second run");

    assert_eq!(first.result(), second.result());
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first_calls, launcher.calls());
}

#[tokio::test(start_paused = true)]
async fn test_cooldowns_paced_in_virtual_time() {
    let launcher = FakeLauncher::new(Script::showing("Call Accepted Successfully"));
    let session = common::session_with(&launcher, SessionTimeouts::default());

    let start = tokio::time::Instant::now();
    let report = session.run(&accept_call()).await.expect("probe runs");
    let elapsed = start.elapsed();

    assert!(report.passed);
    // Three step cooldowns of 3s plus the 5s pause after a passing assertion
    assert!(elapsed >= Duration::from_secs(14));
    assert!(elapsed < Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_no_post_assertion_cooldown_on_failure() {
    let launcher = FakeLauncher::new(Script::default());
    let session = common::session_with(&launcher, SessionTimeouts::default());

    let start = tokio::time::Instant::now();
    let report = session.run(&accept_call()).await.expect("probe runs");
    let elapsed = start.elapsed();

    assert!(!report.passed);
    assert!(elapsed >= Duration::from_secs(9));
    assert!(elapsed < Duration::from_secs(10));
}
