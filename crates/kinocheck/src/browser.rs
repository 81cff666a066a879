//! Real browser session over the Chrome DevTools Protocol.
//!
//! Only compiled with the `browser` feature. [`CdpSession`] implements the
//! synchronous [`Session`] contract by owning a tokio runtime and blocking on
//! each CDP call; the DOM is driven through the JavaScript the locators
//! generate, with located elements tagged by a `data-kinocheck-id` attribute
//! so later interactions can address them.

use std::sync::Mutex;

use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde_json::Value;

use crate::locator::Locator;
use crate::result::{KinocheckError, KinocheckResult};
use crate::session::{ElementHandle, Session};

/// Launch configuration for a CDP-backed session
#[derive(Debug, Clone)]
pub struct BrowserSessionConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            window_width: 1280,
            window_height: 900,
        }
    }
}

impl BrowserSessionConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable the sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set the window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }
}

fn session_err(e: impl ToString) -> KinocheckError {
    KinocheckError::SessionError {
        message: e.to_string(),
    }
}

/// Script mapping the locator's matches to serialized element handles
fn elements_script(locator: &Locator) -> String {
    format!(
        "(() => {{ const matches = {}; return matches.map(el => {{ \
         if (!el.dataset.kinocheckId) {{ el.dataset.kinocheckId = 'kc-' + Math.random().toString(36).slice(2); }} \
         const rect = el.getBoundingClientRect(); \
         const style = window.getComputedStyle(el); \
         return {{ id: el.dataset.kinocheckId, tag_name: el.tagName.toLowerCase(), text: el.textContent, \
         displayed: rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none', \
         enabled: !el.disabled }}; }}); }})()",
        locator.to_query_all()
    )
}

/// Script resolving a previously tagged element, binding it as `el`
fn with_element(id: &str, body: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector('[data-kinocheck-id={id:?}]'); \
         if (!el) return false; {body} return true; }})()"
    )
}

/// A live browser session.
///
/// Owns the browser process and the tokio runtime it is driven from. Fixtures
/// create it before a scenario and call [`CdpSession::close`] on every exit
/// path; the core only ever borrows it.
pub struct CdpSession {
    config: BrowserSessionConfig,
    runtime: tokio::runtime::Runtime,
    browser: Mutex<CdpBrowser>,
    pages: Mutex<Vec<CdpPage>>,
    current: Mutex<usize>,
    _handler: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for CdpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpSession")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CdpSession {
    /// Launch a browser and open a blank page.
    ///
    /// # Errors
    ///
    /// Returns [`KinocheckError::SessionError`] when the browser cannot be
    /// launched.
    pub fn launch(config: BrowserSessionConfig) -> KinocheckResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let mut builder = CdpConfig::builder()
            .window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(session_err)?;

        let (browser, mut handler) = runtime
            .block_on(CdpBrowser::launch(cdp_config))
            .map_err(session_err)?;

        let handle = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = runtime
            .block_on(browser.new_page("about:blank"))
            .map_err(session_err)?;

        tracing::info!(headless = config.headless, "browser session launched");
        Ok(Self {
            config,
            runtime,
            browser: Mutex::new(browser),
            pages: Mutex::new(vec![page]),
            current: Mutex::new(0),
            _handler: handle,
        })
    }

    /// The launch configuration
    #[must_use]
    pub const fn config(&self) -> &BrowserSessionConfig {
        &self.config
    }

    /// Close the browser process.
    ///
    /// # Errors
    ///
    /// Returns [`KinocheckError::SessionError`] when shutdown fails.
    pub fn close(self) -> KinocheckResult<()> {
        let mut browser = self.browser.into_inner().unwrap_or_else(|e| e.into_inner());
        self.runtime
            .block_on(browser.close())
            .map_err(session_err)?;
        tracing::info!("browser session closed");
        Ok(())
    }

    fn page(&self) -> KinocheckResult<CdpPage> {
        let pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        let index = *self.current.lock().unwrap_or_else(|e| e.into_inner());
        pages.get(index).cloned().ok_or_else(|| session_err("no open page"))
    }

    fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> KinocheckResult<T> {
        let page = self.page()?;
        self.runtime.block_on(async {
            let result = page.evaluate(script).await.map_err(session_err)?;
            result.into_value().map_err(session_err)
        })
    }

    fn refresh_pages(&self) -> KinocheckResult<usize> {
        let browser = self.browser.lock().unwrap_or_else(|e| e.into_inner());
        let open = self.runtime.block_on(browser.pages()).map_err(session_err)?;
        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        *pages = open;
        Ok(pages.len())
    }

    fn run_on_element(&self, id: &str, body: &str, what: &str) -> KinocheckResult<()> {
        let touched: bool = self.eval(&with_element(id, body))?;
        if touched {
            Ok(())
        } else {
            Err(KinocheckError::ActionFailed {
                message: format!("{what}: element {id} is gone"),
            })
        }
    }
}

impl Session for CdpSession {
    fn navigate(&self, url: &str) -> KinocheckResult<()> {
        let page = self.page()?;
        self.runtime
            .block_on(page.goto(url))
            .map(|_| ())
            .map_err(session_err)
    }

    fn find_elements(&self, locator: &Locator) -> KinocheckResult<Vec<ElementHandle>> {
        self.eval(&elements_script(locator))
    }

    fn click_element(&self, element: &ElementHandle) -> KinocheckResult<()> {
        self.run_on_element(
            &element.id,
            "el.scrollIntoView({block: 'center'}); el.click();",
            "click",
        )
    }

    fn clear_element(&self, element: &ElementHandle) -> KinocheckResult<()> {
        self.run_on_element(
            &element.id,
            "el.value = ''; el.dispatchEvent(new Event('input', {bubbles: true}));",
            "clear",
        )
    }

    fn type_into(&self, element: &ElementHandle, text: &str) -> KinocheckResult<()> {
        let body = format!(
            "el.focus(); el.value = {text:?}; \
             el.dispatchEvent(new Event('input', {{bubbles: true}})); \
             el.dispatchEvent(new Event('change', {{bubbles: true}}));"
        );
        self.run_on_element(&element.id, &body, "type")
    }

    fn send_enter(&self, element: &ElementHandle) -> KinocheckResult<()> {
        let body = "for (const kind of ['keydown', 'keypress', 'keyup']) { \
                    el.dispatchEvent(new KeyboardEvent(kind, {key: 'Enter', code: 'Enter', keyCode: 13, bubbles: true})); } \
                    if (el.form) { el.form.requestSubmit ? el.form.requestSubmit() : el.form.submit(); }";
        self.run_on_element(&element.id, body, "send enter")
    }

    fn execute_script(&self, script: &str) -> KinocheckResult<Value> {
        self.eval(script)
    }

    fn current_url(&self) -> KinocheckResult<String> {
        self.eval("window.location.href")
    }

    fn title(&self) -> KinocheckResult<String> {
        self.eval("document.title")
    }

    fn page_source(&self) -> KinocheckResult<String> {
        self.eval("document.documentElement.outerHTML")
    }

    fn screenshot(&self) -> KinocheckResult<Vec<u8>> {
        let page = self.page()?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self
            .runtime
            .block_on(page.execute(params))
            .map_err(|e| KinocheckError::ScreenshotError {
                message: e.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| KinocheckError::ScreenshotError {
                message: e.to_string(),
            })
    }

    fn window_handles(&self) -> KinocheckResult<Vec<String>> {
        let count = self.refresh_pages()?;
        Ok((0..count).map(|i| format!("tab-{i}")).collect())
    }

    fn switch_to_window(&self, handle: &str) -> KinocheckResult<()> {
        let index: usize = handle
            .strip_prefix("tab-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| session_err(format!("no such window: {handle}")))?;
        {
            let pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
            if index >= pages.len() {
                return Err(session_err(format!("no such window: {handle}")));
            }
        }
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = index;
        let page = self.page()?;
        self.runtime
            .block_on(page.bring_to_front())
            .map(|_| ())
            .map_err(session_err)
    }

    fn close_window(&self) -> KinocheckResult<()> {
        let page = {
            let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
            let index = *self.current.lock().unwrap_or_else(|e| e.into_inner());
            if index >= pages.len() {
                return Err(session_err("no open page"));
            }
            pages.remove(index)
        };
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = 0;
        self.runtime.block_on(page.close()).map_err(session_err)
    }
}
