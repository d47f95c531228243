pub mod browser;
pub mod contract;
pub mod context;
pub mod dom;
pub mod error;
pub mod server;

//  Re-export commonly used items
pub use browser::{BrowserSession, PageContext, SessionConfig};
pub use contract::{
    verify, AssertionOutcome, CheckKind, ContractReport, ContractSpec, ControlRule,
};
pub use context::{SuiteContext, TestContext};
pub use dom::DomQuery;
pub use error::{HarnessError, Result};
pub use server::{default_port, AssetServer, DEFAULT_PORT};
