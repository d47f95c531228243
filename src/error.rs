use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to bind asset server: {0}")]
    ServerBind(String),

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Navigation to {url} timed out waiting for the load event")]
    NavigationTimeout { url: String },

    #[error("Value from page context could not be marshalled: {0}")]
    Marshal(String),

    #[error("Browser session is already closed")]
    SessionClosed,

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
