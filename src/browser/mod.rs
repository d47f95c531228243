pub mod session;

pub use session::{BrowserSession, PageContext, SessionConfig, DEFAULT_NAV_TIMEOUT};
