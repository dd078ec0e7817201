//! Connection test inputs and outcomes

use crate::types::{AttemptStatus, Backend, BackendSelection, FailureKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A username/password pair; only ever complete
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Build credentials when both parts are non-empty.
    ///
    /// A partial override is dropped so the connector falls back to the
    /// values stored in the DSN.
    pub fn new(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self {
                username: u.to_string(),
                password: p.to_string(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// One requested test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub dsn_name: String,
    pub selection: BackendSelection,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl ConnectionAttempt {
    pub fn new<S: Into<String>>(dsn_name: S, selection: BackendSelection, timeout: Duration) -> Self {
        Self { dsn_name: dsn_name.into(), selection, credentials: None, timeout }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// What a connector receives for one backend attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub dsn_name: String,
    pub credentials: Option<Credentials>,
    /// Passed through untouched from the attempt
    pub timeout: Duration,
    /// Store files the driver manager should read
    pub dsn_file: Option<PathBuf>,
    pub driver_file: Option<PathBuf>,
}

impl ConnectionDescriptor {
    /// `DSN=..;UID=..;PWD=..` with the password replaced by one `*` per character
    pub fn masked_connection_string(&self) -> String {
        match &self.credentials {
            Some(c) => format!(
                "DSN={};UID={};PWD={}",
                self.dsn_name,
                c.username,
                "*".repeat(c.password.chars().count())
            ),
            None => format!("DSN={}", self.dsn_name),
        }
    }

    /// Unmasked form handed to the driver manager
    pub fn connection_string(&self) -> String {
        match &self.credentials {
            Some(c) => format!("DSN={};UID={};PWD={}", self.dsn_name, c.username, c.password),
            None => format!("DSN={}", self.dsn_name),
        }
    }
}

/// Classified failure of one backend attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub sqlstate: Option<String>,
    /// Driver manager output, verbatim
    pub message: String,
}

/// Outcome of one backend attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResult {
    pub backend: Backend,
    pub status: AttemptStatus,
    pub failure: Option<FailureDetail>,
    pub duration: Duration,
}

impl ConnectionResult {
    pub fn success(backend: Backend, duration: Duration) -> Self {
        Self { backend, status: AttemptStatus::Success, failure: None, duration }
    }

    pub fn failure(backend: Backend, detail: FailureDetail, duration: Duration) -> Self {
        Self { backend, status: AttemptStatus::Failed, failure: Some(detail), duration }
    }

    pub fn is_success(&self) -> bool {
        self.status == AttemptStatus::Success
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

/// Note raised when a DSN stores a library path where a driver name belongs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverAdvisory {
    pub dsn_name: String,
    pub configured_value: String,
    /// Registered driver whose library matches, if any
    pub suggested_driver: Option<String>,
}

impl DriverAdvisory {
    pub fn message(&self) -> String {
        match &self.suggested_driver {
            Some(name) => format!(
                "DSN '{}' uses the library path '{}' as its driver; the registered driver '{}' points at that library",
                self.dsn_name, self.configured_value, name
            ),
            None => format!(
                "DSN '{}' uses the library path '{}' as its driver and no registered driver points at it",
                self.dsn_name, self.configured_value
            ),
        }
    }
}

/// Everything one test produced, in attempt order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub dsn_name: String,
    /// Whether the DSN exists in the loaded store
    pub dsn_known: bool,
    pub advisory: Option<DriverAdvisory>,
    pub results: Vec<ConnectionResult>,
}

impl TestReport {
    /// True when any backend succeeded
    pub fn overall_success(&self) -> bool {
        self.results.iter().any(ConnectionResult::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConnectionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
