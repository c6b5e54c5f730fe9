use crate::error::Result;
use crate::launch::LaunchOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When a navigation is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// Return as soon as the navigation is committed
    Commit,
    /// Wait for the load event
    Load,
}

/// Document lifecycle milestone a settle wait aims for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    DomContentLoaded,
    Load,
}

impl LoadState {
    /// Whether a `document.readyState` value has reached this milestone.
    #[must_use]
    pub fn is_reached(self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load => ready_state == "complete",
        }
    }
}

/// A frame attached to the page at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    pub id: String,
    pub url: String,
    pub is_main: bool,
}

/// One browser, one context, one page, driven step by step.
///
/// Every method that waits on the browser takes its own timeout; the
/// implementation reports an expired budget as [`BrowserError::Timeout`].
///
/// [`BrowserError::Timeout`]: crate::BrowserError::Timeout
#[async_trait::async_trait]
pub trait BrowserActions: Send {
    /// Navigate the page to an absolute URL
    async fn navigate(&mut self, url: &str, wait_until: WaitUntil, timeout: Duration)
        -> Result<()>;

    /// Wait for the page's main document to reach a load state
    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> Result<()>;

    /// Enumerate the frames currently attached to the page, main frame first
    async fn frames(&mut self) -> Result<Vec<FrameRef>>;

    /// Wait for one frame's document to reach a load state
    async fn wait_for_frame_load_state(
        &mut self,
        frame: &FrameRef,
        state: LoadState,
        timeout: Duration,
    ) -> Result<()>;

    /// Dispatch a mouse wheel event
    async fn mouse_wheel(&mut self, delta_x: f64, delta_y: f64, timeout: Duration) -> Result<()>;

    /// Succeed once an element containing `text` is visible
    async fn expect_text_visible(&mut self, text: &str, timeout: Duration) -> Result<()>;

    /// Close the browsing context, releasing its page
    async fn close_context(&mut self) -> Result<()>;

    /// Close the browser process
    async fn close_browser(&mut self) -> Result<()>;

    /// Stop the automation driver
    async fn stop_driver(&mut self) -> Result<()>;
}

/// Acquires a fresh [`BrowserActions`] session per probe.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserActions;

    /// Start the driver, launch the browser and open one context and page.
    ///
    /// Anything acquired before a failure is released before returning.
    async fn launch(&self, options: &LaunchOptions) -> Result<Self::Session>;
}
