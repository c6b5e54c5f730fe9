//! Scripted browser that records every call it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use probe_browser::{
    BrowserActions, BrowserError, BrowserLauncher, FrameRef, LaunchOptions, LoadState, WaitUntil,
};
use probe_core::BaseUrl;
use probe_harness::{ProbeSession, SessionTimeouts};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE: &str = "http://app.test";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Launch { default_timeout: Duration },
    Navigate {
        path: String,
        wait_until: WaitUntil,
        timeout: Duration,
    },
    PageSettle { timeout: Duration },
    Frames,
    FrameSettle { id: String },
    Wheel {
        delta_x: f64,
        delta_y: f64,
        timeout: Duration,
    },
    ExpectVisible { text: String, timeout: Duration },
    CloseContext,
    CloseBrowser,
    StopDriver,
}

impl Call {
    pub fn is_navigate(&self) -> bool {
        matches!(self, Self::Navigate { .. })
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Navigate { .. } | Self::Wheel { .. })
    }

    pub fn is_teardown(&self) -> bool {
        matches!(self, Self::CloseContext | Self::CloseBrowser | Self::StopDriver)
    }
}

/// How the fake browser behaves.
#[derive(Debug, Clone)]
pub struct Script {
    pub launch_fails: bool,
    /// Texts the page shows
    pub visible: Vec<&'static str>,
    /// Paths whose navigation errors outright
    pub unreachable: Vec<&'static str>,
    /// Paths whose navigation times out
    pub slow: Vec<&'static str>,
    pub frames: Vec<FrameRef>,
    /// Frame IDs that never settle
    pub stuck_frames: Vec<&'static str>,
    pub frames_unavailable: bool,
    pub page_never_settles: bool,
    pub wheel_fails: bool,
    pub assertion_errors: bool,
    pub teardown_fails: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            launch_fails: false,
            visible: Vec::new(),
            unreachable: Vec::new(),
            slow: Vec::new(),
            frames: vec![frame("main", true)],
            stuck_frames: Vec::new(),
            frames_unavailable: false,
            page_never_settles: false,
            wheel_fails: false,
            assertion_errors: false,
            teardown_fails: false,
        }
    }
}

impl Script {
    pub fn showing(text: &'static str) -> Self {
        Self {
            visible: vec![text],
            ..Self::default()
        }
    }
}

pub fn frame(id: &str, is_main: bool) -> FrameRef {
    FrameRef {
        id: id.to_string(),
        url: format!("{BASE}/{id}"),
        is_main,
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    script: Script,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock calls").clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn navigations(&self) -> Vec<(String, WaitUntil)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Navigate {
                    path, wait_until, ..
                } => Some((path, wait_until)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("lock calls").clear();
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self, options: &LaunchOptions) -> probe_browser::Result<FakeSession> {
        self.calls.lock().expect("lock calls").push(Call::Launch {
            default_timeout: options.default_timeout,
        });

        if self.script.launch_fails {
            return Err(BrowserError::Launch("chrome executable not found".to_string()));
        }

        Ok(FakeSession {
            script: self.script.clone(),
            calls: Arc::clone(&self.calls),
        })
    }
}

pub struct FakeSession {
    script: Script,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeSession {
    fn record(&self, call: Call) {
        self.calls.lock().expect("lock calls").push(call);
    }
}

#[async_trait]
impl BrowserActions for FakeSession {
    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> probe_browser::Result<()> {
        let path = url.strip_prefix(BASE).unwrap_or(url).to_string();
        self.record(Call::Navigate {
            path: path.clone(),
            wait_until,
            timeout,
        });

        if self.script.unreachable.contains(&path.as_str()) {
            return Err(BrowserError::Navigation(format!("net::ERR_ABORTED at {path}")));
        }
        if self.script.slow.contains(&path.as_str()) {
            return Err(BrowserError::timeout("navigation", timeout));
        }
        Ok(())
    }

    async fn wait_for_load_state(
        &mut self,
        _state: LoadState,
        timeout: Duration,
    ) -> probe_browser::Result<()> {
        self.record(Call::PageSettle { timeout });
        if self.script.page_never_settles {
            return Err(BrowserError::timeout("page settle", timeout));
        }
        Ok(())
    }

    async fn frames(&mut self) -> probe_browser::Result<Vec<FrameRef>> {
        self.record(Call::Frames);
        if self.script.frames_unavailable {
            return Err(BrowserError::Evaluation("frame tree unavailable".to_string()));
        }
        Ok(self.script.frames.clone())
    }

    async fn wait_for_frame_load_state(
        &mut self,
        frame: &FrameRef,
        _state: LoadState,
        timeout: Duration,
    ) -> probe_browser::Result<()> {
        self.record(Call::FrameSettle {
            id: frame.id.clone(),
        });
        if self.script.stuck_frames.contains(&frame.id.as_str()) {
            return Err(BrowserError::timeout("frame settle", timeout));
        }
        Ok(())
    }

    async fn mouse_wheel(
        &mut self,
        delta_x: f64,
        delta_y: f64,
        timeout: Duration,
    ) -> probe_browser::Result<()> {
        self.record(Call::Wheel {
            delta_x,
            delta_y,
            timeout,
        });
        if self.script.wheel_fails {
            return Err(BrowserError::Interaction("target closed".to_string()));
        }
        Ok(())
    }

    async fn expect_text_visible(
        &mut self,
        text: &str,
        timeout: Duration,
    ) -> probe_browser::Result<()> {
        self.record(Call::ExpectVisible {
            text: text.to_string(),
            timeout,
        });
        if self.script.assertion_errors {
            return Err(BrowserError::Evaluation("execution context destroyed".to_string()));
        }
        if self.script.visible.contains(&text) {
            Ok(())
        } else {
            Err(BrowserError::timeout("text visibility", timeout))
        }
    }

    async fn close_context(&mut self) -> probe_browser::Result<()> {
        self.record(Call::CloseContext);
        if self.script.teardown_fails {
            return Err(BrowserError::Teardown("context already gone".to_string()));
        }
        Ok(())
    }

    async fn close_browser(&mut self) -> probe_browser::Result<()> {
        self.record(Call::CloseBrowser);
        if self.script.teardown_fails {
            return Err(BrowserError::Teardown("browser crashed".to_string()));
        }
        Ok(())
    }

    async fn stop_driver(&mut self) -> probe_browser::Result<()> {
        self.record(Call::StopDriver);
        if self.script.teardown_fails {
            return Err(BrowserError::Teardown("driver task panicked".to_string()));
        }
        Ok(())
    }
}

pub fn base_url() -> BaseUrl {
    BaseUrl::parse(BASE).expect("valid base URL")
}

/// Session against the fake with cooldowns disabled.
pub fn session(launcher: &FakeLauncher) -> ProbeSession<FakeLauncher> {
    session_with(launcher, SessionTimeouts::default().without_cooldowns())
}

pub fn session_with(
    launcher: &FakeLauncher,
    timeouts: SessionTimeouts,
) -> ProbeSession<FakeLauncher> {
    ProbeSession::new(
        launcher.clone(),
        LaunchOptions::default(),
        base_url(),
        timeouts,
    )
}
