//! Type definitions shared across the stores and the tester

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// ODBC driver manager implementations a connection can be routed through.
///
/// The derived ordering is the fixed order used when every backend is
/// attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// unixODBC, driven through `isql`
    UnixOdbc,
    /// iODBC, driven through `iodbctest`
    IOdbc,
}

impl Backend {
    /// All backends in attempt order
    pub const ALL: [Backend; 2] = [Backend::UnixOdbc, Backend::IOdbc];

    /// Get a human-readable name for this backend
    pub fn name(&self) -> &'static str {
        match self {
            Backend::UnixOdbc => "unixODBC",
            Backend::IOdbc => "iODBC",
        }
    }

    /// Test program shipped with the driver manager
    pub fn program(&self) -> &'static str {
        match self {
            Backend::UnixOdbc => "isql",
            Backend::IOdbc => "iodbctest",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unixodbc" | "unix" | "isql" => Ok(Backend::UnixOdbc),
            "iodbc" | "iodbctest" => Ok(Backend::IOdbc),
            _ => Err(AppError::parse(format!("Unknown ODBC manager: {}", s))),
        }
    }
}

/// Which backends a connection test should go through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendSelection {
    /// Exactly one backend
    Specific(Backend),
    /// Every available backend, in [`Backend::ALL`] order
    All,
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self::All
    }
}

impl fmt::Display for BackendSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendSelection::Specific(backend) => write!(f, "{}", backend),
            BackendSelection::All => f.write_str("all"),
        }
    }
}

impl FromStr for BackendSelection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "both" => Ok(BackendSelection::All),
            other => other.parse::<Backend>().map(BackendSelection::Specific),
        }
    }
}

/// Classified reason a backend attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// DSN or its driver could not be resolved by the manager (IM002)
    DriverNotFound,
    /// Driver library exists in config but could not be loaded (IM003)
    DriverLoadFailed,
    /// Credentials were rejected
    AuthenticationRejected,
    /// Server could not be reached
    HostUnreachable,
    /// Server refused the connection
    ConnectionRejected,
    /// Attempt exceeded its timeout
    Timeout,
    /// The backend is not installed or not configured
    BackendUnavailable,
    /// Anything the classifier does not recognize
    Unclassified,
}

impl FailureKind {
    /// Short label used in reports and logs
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::DriverNotFound => "driver not found",
            FailureKind::DriverLoadFailed => "driver load failed",
            FailureKind::AuthenticationRejected => "authentication rejected",
            FailureKind::HostUnreachable => "host unreachable",
            FailureKind::ConnectionRejected => "connection rejected",
            FailureKind::Timeout => "timeout",
            FailureKind::BackendUnavailable => "backend unavailable",
            FailureKind::Unclassified => "unclassified",
        }
    }

    /// Whether the classifier recognized the failure
    pub fn is_classified(&self) -> bool {
        !matches!(self, FailureKind::Unclassified)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status of one backend attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Connected and the round-trip query returned
    Success,
    /// Attempt failed
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_order_is_fixed() {
        let mut backends = vec![Backend::IOdbc, Backend::UnixOdbc];
        backends.sort();
        assert_eq!(backends, Backend::ALL.to_vec());
    }

    #[test]
    fn test_backend_selection_parsing() {
        assert_eq!("all".parse::<BackendSelection>().unwrap(), BackendSelection::All);
        assert_eq!("Both".parse::<BackendSelection>().unwrap(), BackendSelection::All);
        assert_eq!(
            "unixODBC".parse::<BackendSelection>().unwrap(),
            BackendSelection::Specific(Backend::UnixOdbc)
        );
        assert_eq!(
            "iodbc".parse::<BackendSelection>().unwrap(),
            BackendSelection::Specific(Backend::IOdbc)
        );
        assert!("odbc32".parse::<BackendSelection>().is_err());
    }

    #[test]
    fn test_failure_kind_labels() {
        assert_eq!(FailureKind::DriverNotFound.to_string(), "driver not found");
        assert!(FailureKind::Timeout.is_classified());
        assert!(!FailureKind::Unclassified.is_classified());
    }
}
