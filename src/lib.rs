//! ODBC DSN Manager
//!
//! Reads and writes the ODBC configuration files (`odbc.ini` for data
//! sources, `odbcinst.ini` for drivers), repairs DSNs that name a driver
//! library path instead of a registered driver, and tests connections
//! through the unixODBC and iODBC driver managers.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod tester;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, ConnectionAttempt, ConnectionResult, DriverEntry, DsnEntry, TestReport};
pub use output::{ColoredFormatter, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use registry::{DsnGroup, Registry};
pub use resolver::DriverResolver;
pub use store::{ConfigSection, ConfigStore};
pub use tester::{Connector, ConnectorOutcome, ConnectionTester};
pub use types::{Backend, BackendSelection, FailureKind};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Build timestamp, when the build script recorded one
pub const BUILD_TIME: Option<&str> = option_env!("BUILD_TIME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const MAX_TIMEOUT_SECONDS: u64 = 300;
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
