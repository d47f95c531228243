//! Suite- and test-scoped contexts
//!
//! Explicit context objects instead of module-level singletons: a
//! [`SuiteContext`] owns the asset server for a whole group of tests, and
//! hands out one [`TestContext`] (fresh browser session, navigated page)
//! per test. Several suites can coexist in one process as long as they use
//! distinct ports.
//!
//! Ordering is strict: the server is listening before any navigation, and a
//! session never outlives its owning test's teardown.

use std::path::PathBuf;

use crate::browser::{BrowserSession, PageContext, SessionConfig};
use crate::dom::DomQuery;
use crate::error::Result;
use crate::server::AssetServer;

/// Suite-level state: the running asset server.
pub struct SuiteContext {
    server: AssetServer,
}

impl SuiteContext {
    /// Suite setup: start serving `root` on `port` (0 for an ephemeral
    /// port). Called exactly once per suite.
    pub async fn start(root: impl Into<PathBuf>, port: u16) -> Result<Self> {
        let server = AssetServer::start(root, port).await?;
        Ok(Self { server })
    }

    pub fn server(&self) -> &AssetServer {
        &self.server
    }

    pub fn url_for(&self, path: &str) -> String {
        self.server.url_for(path)
    }

    /// Test setup: launch a fresh session and navigate it to `path` on this
    /// suite's server.
    pub async fn open(&self, path: &str) -> Result<TestContext> {
        self.open_with(path, SessionConfig::auto()).await
    }

    /// [`SuiteContext::open`] with explicit launch options.
    ///
    /// If page creation or navigation fails, the half-built session is
    /// closed before the error propagates; no engine process leaks from a
    /// failed setup.
    pub async fn open_with(&self, path: &str, config: SessionConfig) -> Result<TestContext> {
        let mut session = BrowserSession::launch(config).await?;

        let page = match session.new_page().await {
            Ok(page) => page,
            Err(e) => {
                let _ = session.close().await;
                return Err(e);
            }
        };

        if let Err(e) = page.navigate(&self.url_for(path)).await {
            let _ = session.close().await;
            return Err(e);
        }

        Ok(TestContext { session, page })
    }

    /// Suite teardown: stop the server and release its port.
    pub async fn stop(self) {
        self.server.stop().await;
    }
}

/// Test-level state: one session with one navigated page, owned exclusively
/// by the test currently running.
pub struct TestContext {
    session: BrowserSession,
    page: PageContext,
}

impl TestContext {
    /// Query layer over this test's page.
    pub fn dom(&self) -> DomQuery<'_> {
        DomQuery::new(self.page.page())
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    /// Test teardown. Runs the session close unconditionally; consuming
    /// `self` makes a leaked session visible at the call site.
    pub async fn close(mut self) -> Result<()> {
        self.session.close().await
    }
}
