//! Static asset server
//!
//! Serves the document under test from a fixed document root so the browser
//! can reach it over plain HTTP. Each instance binds once, runs in the
//! background for the lifetime of a suite, and releases its port on `stop`.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::{Filter, Reply};

use crate::error::{HarnessError, Result};

/// Fallback port when no `PORT` override is present.
pub const DEFAULT_PORT: u16 = 3000;

/// Listening port for the asset server: `PORT` environment override,
/// falling back to [`DEFAULT_PORT`].
pub fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// HTTP server mapping request paths onto files under a document root.
///
/// Responses are either `200` with the raw file bytes, or `404` with a JSON
/// diagnostic body `{"error": ...}`. A missing file is a normal outcome for
/// a wrong path, not a fault.
pub struct AssetServer {
    addr: SocketAddr,
    root: PathBuf,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl AssetServer {
    /// Bind `127.0.0.1:port` (0 picks an ephemeral port) and start serving
    /// `root` in a background task.
    ///
    /// A bind failure (typically the port already being in use) surfaces as
    /// [`HarnessError::ServerBind`]; it aborts suite setup and is not retried.
    pub async fn start(root: impl Into<PathBuf>, port: u16) -> Result<AssetServer> {
        let root = root.into();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let doc_root = root.clone();
        let files = warp::get().and(warp::path::full()).and_then(
            move |full: warp::path::FullPath| {
                let root = doc_root.clone();
                async move { Ok::<_, warp::Rejection>(serve_file(&root, full.as_str()).await) }
            },
        );

        let (addr, server) = warp::serve(files)
            .try_bind_with_graceful_shutdown(([127, 0, 0, 1], port), async {
                shutdown_rx.await.ok();
            })
            .map_err(|e| HarnessError::ServerBind(format!("port {}: {}", port, e)))?;

        let task = tokio::spawn(server);
        log::info!("Asset server listening on http://{} (root: {})", addr, root.display());

        Ok(Self {
            addr,
            root,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Socket address the server is bound to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Document root this server resolves request paths against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base URL, e.g. `http://127.0.0.1:3000`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL for a document path, e.g. `url_for("/index.html")`.
    pub fn url_for(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("http://{}/{}", self.addr, path)
    }

    /// Shut the server down and wait until the listener is gone, so the same
    /// port can be bound again immediately.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        log::info!("Asset server on http://{} stopped", self.addr);
    }
}

impl Drop for AssetServer {
    fn drop(&mut self) {
        // Fallback for suites that never call stop(); the listener winds
        // down shortly after the signal.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_file(root: &Path, request_path: &str) -> warp::reply::Response {
    let Some(file) = resolve(root, request_path) else {
        return not_found(format!("invalid path: {}", request_path));
    };

    match tokio::fs::read(&file).await {
        // Raw bytes, no content-type negotiation: the browser sniffs HTML
        // from the path, and callers must not assume any transform occurred.
        Ok(bytes) => warp::hyper::Response::new(Body::from(bytes)),
        Err(e) => {
            log::debug!("GET {} -> 404 ({})", request_path, e);
            not_found(format!("{}: {}", file.display(), e))
        }
    }
}

fn not_found(detail: String) -> warp::reply::Response {
    let body = warp::reply::json(&serde_json::json!({ "error": detail }));
    warp::reply::with_status(body, StatusCode::NOT_FOUND).into_response()
}

/// Map a request path onto the document root. A bare `/` serves
/// `index.html`; any component that is not a plain name (`..`, a root, a
/// prefix) is rejected so requests cannot escape the root.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let rel = if trimmed.is_empty() { "index.html" } else { trimmed };

    let rel = Path::new(rel);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    Some(root.join(rel))
}
