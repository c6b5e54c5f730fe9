use crate::actions::{BrowserActions, BrowserLauncher, FrameRef, LoadState, WaitUntil};
use crate::error::{BrowserError, Result};
use crate::js;
use crate::launch::LaunchOptions;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CreateIsolatedWorldParams, FrameId, FrameTree, GetFrameTreeParams, NavigateParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{EvaluateParams, ExecutionContextId};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// How often settle waits re-read `document.readyState`
const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How often the visibility expectation re-evaluates the page
const VISIBILITY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches a fresh [`BrowserEngine`] per probe
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

#[async_trait::async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = BrowserEngine;

    async fn launch(&self, options: &LaunchOptions) -> Result<BrowserEngine> {
        BrowserEngine::launch(options).await
    }
}

/// Chrome DevTools session: one browser, one isolated context, one page
pub struct BrowserEngine {
    browser: Browser,
    page: Page,
    context_id: Option<BrowserContextId>,
    driver: Option<JoinHandle<()>>,
    browser_closed: bool,
    default_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chrome and open one context with one blank page
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let config = Self::browser_config(options)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler stream must be polled for any CDP command to complete
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!(error = %e, "cdp handler event error");
                }
            }
            debug!("cdp handler stream ended");
        });

        let context_id = match browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                Self::abandon(browser, driver).await;
                return Err(BrowserError::Context(e.to_string()));
            }
        };

        let mut target = CreateTargetParams::new("about:blank");
        target.browser_context_id = Some(context_id.clone());

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(dispose_err) = browser.dispose_browser_context(context_id).await {
                    warn!(error = %dispose_err, "failed to dispose context after page error");
                }
                Self::abandon(browser, driver).await;
                return Err(BrowserError::Context(e.to_string()));
            }
        };

        debug!(
            headless = options.headless,
            width = options.viewport_width,
            height = options.viewport_height,
            "browser session ready"
        );

        Ok(Self {
            browser,
            page,
            context_id: Some(context_id),
            driver: Some(driver),
            browser_closed: false,
            default_timeout: options.default_timeout,
        })
    }

    fn browser_config(options: &LaunchOptions) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().viewport(Viewport {
            width: options.viewport_width,
            height: options.viewport_height,
            ..Viewport::default()
        });

        if !options.headless {
            builder = builder.with_head();
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in options.chrome_args() {
            builder = builder.arg(arg);
        }

        builder.build().map_err(BrowserError::Launch)
    }

    /// Best-effort release after a failed launch
    async fn abandon(mut browser: Browser, driver: JoinHandle<()>) {
        if let Err(e) = browser.close().await {
            warn!(error = %e, "failed to close browser after launch error");
        }
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "failed to reap browser process");
        }
        driver.abort();
    }

    async fn bounded<T, F>(operation: &str, timeout: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| BrowserError::timeout(operation, timeout))?
    }

    async fn isolated_world(&self, frame: &FrameRef) -> Result<ExecutionContextId> {
        let world = self
            .page
            .execute(CreateIsolatedWorldParams::new(FrameId::new(frame.id.clone())))
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;

        Ok(world.result.execution_context_id.clone())
    }

    async fn ready_state_in(&self, context: ExecutionContextId) -> Result<Option<String>> {
        let params = EvaluateParams::builder()
            .expression(js::READY_STATE)
            .context_id(context)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Evaluation)?;

        let evaluated = self
            .page
            .execute(params)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;

        if evaluated.result.exception_details.is_some() {
            return Ok(None);
        }

        Ok(evaluated
            .result
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_owned))
    }

    fn flatten_frames(tree: &FrameTree, is_main: bool, out: &mut Vec<FrameRef>) {
        out.push(FrameRef {
            id: tree.frame.id.inner().clone(),
            url: tree.frame.url.clone(),
            is_main,
        });

        if let Some(children) = &tree.child_frames {
            for child in children {
                Self::flatten_frames(child, false, out);
            }
        }
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<()> {
        let page = &self.page;
        let operation = format!("navigation to {url}");

        Self::bounded(&operation, timeout, async {
            match wait_until {
                WaitUntil::Commit => {
                    let response = page
                        .execute(NavigateParams::new(url))
                        .await
                        .map_err(|e| BrowserError::Navigation(format!("{url}: {e}")))?;

                    match &response.result.error_text {
                        Some(text) => Err(BrowserError::Navigation(format!("{url}: {text}"))),
                        None => Ok(()),
                    }
                }
                WaitUntil::Load => page
                    .goto(url)
                    .await
                    .map(|_| ())
                    .map_err(|e| BrowserError::Navigation(format!("{url}: {e}"))),
            }
        })
        .await
    }

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> Result<()> {
        let page = &self.page;

        Self::bounded("page settle wait", timeout, async {
            loop {
                match page.evaluate(js::READY_STATE).await {
                    Ok(result) => {
                        if let Ok(ready_state) = result.into_value::<String>() {
                            if state.is_reached(&ready_state) {
                                return Ok(());
                            }
                        }
                    }
                    // The execution context is replaced while a navigation commits
                    Err(e) => trace!(error = %e, "readyState not available yet"),
                }
                tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
            }
        })
        .await
    }

    async fn frames(&mut self) -> Result<Vec<FrameRef>> {
        let tree = Self::bounded("frame enumeration", self.default_timeout, async {
            self.page
                .execute(GetFrameTreeParams::default())
                .await
                .map_err(|e| BrowserError::Evaluation(e.to_string()))
        })
        .await?;

        let mut frames = Vec::new();
        Self::flatten_frames(&tree.result.frame_tree, true, &mut frames);
        Ok(frames)
    }

    async fn wait_for_frame_load_state(
        &mut self,
        frame: &FrameRef,
        state: LoadState,
        timeout: Duration,
    ) -> Result<()> {
        let this = &*self;
        let operation = format!("frame {} settle wait", frame.id);

        Self::bounded(&operation, timeout, async {
            poll_frame_ready(
                state,
                &frame.id,
                move || this.isolated_world(frame),
                move |context| this.ready_state_in(context),
            )
            .await;
            Ok(())
        })
        .await
    }

    async fn mouse_wheel(&mut self, delta_x: f64, delta_y: f64, timeout: Duration) -> Result<()> {
        let mut params = DispatchMouseEventParams::new(DispatchMouseEventType::MouseWheel, 0.0, 0.0);
        params.delta_x = Some(delta_x);
        params.delta_y = Some(delta_y);

        let page = &self.page;
        Self::bounded("mouse wheel", timeout, async {
            page.execute(params)
                .await
                .map(|_| ())
                .map_err(|e| BrowserError::Interaction(e.to_string()))
        })
        .await
    }

    async fn expect_text_visible(&mut self, text: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        let script = js::text_visible(text);
        let operation = format!("visibility of '{text}'");

        Self::bounded(&operation, timeout, async {
            loop {
                match page.evaluate(script.as_str()).await {
                    Ok(result) => {
                        if result.into_value::<bool>().unwrap_or(false) {
                            return Ok(());
                        }
                    }
                    Err(e) => trace!(error = %e, "visibility check failed, retrying"),
                }
                tokio::time::sleep(VISIBILITY_POLL_INTERVAL).await;
            }
        })
        .await
    }

    async fn close_context(&mut self) -> Result<()> {
        let Some(context_id) = self.context_id.take() else {
            return Ok(());
        };

        let browser = &self.browser;
        Self::bounded("context close", self.default_timeout, async {
            browser
                .dispose_browser_context(context_id)
                .await
                .map_err(|e| BrowserError::Teardown(format!("context: {e}")))
        })
        .await
    }

    async fn close_browser(&mut self) -> Result<()> {
        if self.browser_closed {
            return Ok(());
        }
        self.browser_closed = true;

        let browser = &mut self.browser;
        Self::bounded("browser close", self.default_timeout, async {
            browser
                .close()
                .await
                .map_err(|e| BrowserError::Teardown(format!("browser: {e}")))?;
            browser
                .wait()
                .await
                .map_err(|e| BrowserError::Teardown(format!("browser process: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn stop_driver(&mut self) -> Result<()> {
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };

        driver.abort();
        match driver.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(BrowserError::Teardown(format!("driver: {e}"))),
        }
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            debug!("BrowserEngine dropped without teardown, aborting driver");
            driver.abort();
        }
    }
}

/// Poll a frame's `readyState` until it reaches `state`.
///
/// One isolated world serves the whole wait. A new one is created only after
/// evaluation in the current world fails, which happens when the frame
/// navigates and its contexts are destroyed.
async fn poll_frame_ready<C, W, WF, R, RF>(
    state: LoadState,
    frame_id: &str,
    mut create_world: W,
    mut ready_state: R,
) where
    C: Clone,
    W: FnMut() -> WF,
    WF: Future<Output = Result<C>>,
    R: FnMut(C) -> RF,
    RF: Future<Output = Result<Option<String>>>,
{
    let mut world: Option<C> = None;

    loop {
        if world.is_none() {
            match create_world().await {
                Ok(context) => world = Some(context),
                Err(e) => trace!(frame = %frame_id, error = %e, "isolated world unavailable"),
            }
        }

        if let Some(context) = world.clone() {
            match ready_state(context).await {
                Ok(Some(current)) if state.is_reached(&current) => return,
                Ok(_) => {}
                Err(e) => {
                    trace!(frame = %frame_id, error = %e, "frame readyState unavailable");
                    world = None;
                }
            }
        }

        tokio::time::sleep(SETTLE_POLL_INTERVAL).await;
    }
}
