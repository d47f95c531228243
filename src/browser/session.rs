//! Browser session lifecycle
//!
//! One [`BrowserSession`] owns one isolated Chrome instance with a unique
//! temporary profile directory, so nothing (cookies, DOM, history) survives
//! from one session to the next. Sessions are created fresh per test and
//! must be closed on every exit path.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventLoadEventFired, NavigateParams};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::{HarnessError, Result};

/// Upper bound on how long a navigation may wait for the load event.
pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(10);

/// Launch options for a [`BrowserSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Explicit Chrome executable; `None` lets chromiumoxide find the
    /// system installation.
    pub chrome_path: Option<String>,
    /// Pass `--no-sandbox` (Linux CI environments usually need this).
    pub no_sandbox: bool,
    pub headless: bool,
    pub nav_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            no_sandbox: false,
            headless: true,
            nav_timeout: DEFAULT_NAV_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Detect CI environments and enable `--no-sandbox` there.
    pub fn auto() -> Self {
        let is_ci = ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_HOME", "CIRCLECI"]
            .iter()
            .any(|var| std::env::var(var).is_ok());

        Self {
            no_sandbox: is_ci,
            ..Self::default()
        }
    }

    pub fn nav_timeout(mut self, timeout: Duration) -> Self {
        self.nav_timeout = timeout;
        self
    }
}

/// One isolated Chrome instance plus its pages, scoped to a single test.
pub struct BrowserSession {
    browser: Option<Browser>,
    handler_task: JoinHandle<()>,
    temp_dir: Option<PathBuf>,
    nav_timeout: Duration,
}

impl BrowserSession {
    /// Launch an isolated Chrome instance.
    ///
    /// A failure here (missing executable, broken sandbox) is a fatal setup
    /// error for the owning test; it is never retried.
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        // Unique profile directory per session, so parallel runs and
        // consecutive sessions never share state.
        let unique_id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let temp_dir =
            std::env::temp_dir().join(format!("domcheck-{}-{}", std::process::id(), unique_id));
        std::fs::create_dir_all(&temp_dir).map_err(|e| {
            HarnessError::LaunchFailed(format!("failed to create profile dir: {}", e))
        })?;

        let mut builder = if config.headless {
            BrowserConfig::builder()
        } else {
            BrowserConfig::builder().with_head()
        };
        builder = builder.user_data_dir(&temp_dir);
        if config.no_sandbox {
            builder = builder.arg("--no-sandbox");
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| HarnessError::LaunchFailed(launch_help(&e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| HarnessError::LaunchFailed(launch_help(&e.to_string())))?;

        // Drive CDP events for the lifetime of the browser; the stream ends
        // when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while (handler.next().await).is_some() {}
        });

        log::debug!("Chrome launched with profile {}", temp_dir.display());

        Ok(Self {
            browser: Some(browser),
            handler_task,
            temp_dir: Some(temp_dir),
            nav_timeout: config.nav_timeout,
        })
    }

    /// Open a fresh blank page in this session.
    pub async fn new_page(&self) -> Result<PageContext> {
        let browser = self.browser.as_ref().ok_or(HarnessError::SessionClosed)?;
        let page = browser.new_page("about:blank").await?;
        Ok(PageContext {
            page,
            nav_timeout: self.nav_timeout,
        })
    }

    /// Close the browser and all its pages. Idempotent: calling it twice,
    /// or after a failed test body, is fine.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut browser) = self.browser.take() {
            let close_result = browser.close().await;
            // Reap the process so no engine instance outlives the test.
            let _ = browser.wait().await;
            self.handler_task.abort();

            if let Some(dir) = self.temp_dir.take() {
                let _ = tokio::fs::remove_dir_all(dir).await;
            }

            close_result?;
            log::debug!("Chrome session closed");
        }
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(temp_dir) = &self.temp_dir {
            if temp_dir.exists() {
                let _ = std::fs::remove_dir_all(temp_dir);
            }
        }
    }
}

/// The loaded-document state inside a session. All DOM queries run against
/// the page held here; it goes away with the owning session.
pub struct PageContext {
    page: Page,
    nav_timeout: Duration,
}

impl PageContext {
    /// Navigate and wait until the document's load event fires.
    ///
    /// The whole operation runs under the session's navigation timeout, so a
    /// hung navigation becomes [`HarnessError::NavigationTimeout`] instead of
    /// hanging the suite. Callers must treat any error as a failed
    /// precondition and not assert against a half-loaded page.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        match tokio::time::timeout(self.nav_timeout, self.navigate_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(HarnessError::NavigationTimeout {
                url: url.to_string(),
            }),
        }
    }

    async fn navigate_inner(&self, url: &str) -> Result<()> {
        // Subscribe before navigating so the load event cannot be missed.
        let mut load_events = self.page.event_listener::<EventLoadEventFired>().await?;

        let params = NavigateParams::builder().url(url).build().map_err(|e| {
            HarnessError::NavigationFailed(format!("invalid URL {}: {}", url, e))
        })?;

        let response = self.page.execute(params).await?;
        if let Some(error_text) = &response.result.error_text {
            return Err(HarnessError::NavigationFailed(format!(
                "{}: {}",
                url, error_text
            )));
        }

        match load_events.next().await {
            Some(_) => {
                log::debug!("Load event fired for {}", url);
                Ok(())
            }
            None => Err(HarnessError::NavigationFailed(format!(
                "{}: event stream closed before the load event",
                url
            ))),
        }
    }

    /// The underlying page, for the query layer.
    pub fn page(&self) -> &Page {
        &self.page
    }
}

fn launch_help(detail: &str) -> String {
    format!(
        "{}. \n\n\
         Chrome not found or failed to start. You can:\n\
         - Install Chrome: https://www.google.com/chrome/\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - macOS: brew install --cask google-chrome\n\
         - Or set SessionConfig::chrome_path to the executable\n\
         - Linux sandbox issue? Set SessionConfig::no_sandbox",
        detail
    )
}
