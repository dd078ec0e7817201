//! Connection testing across driver manager backends
//!
//! A test is one deterministic pass over the selected backends: each
//! backend is attempted independently, in [`Backend::ALL`] order, and the
//! caller reads overall success as "any backend succeeded".

pub mod classify;
pub mod connector;
pub mod process;

pub use classify::classify;
pub use connector::{Connector, ConnectorOutcome};
pub use process::{BackendDetector, ProcessConnector};

use crate::logging::ConnectionLogger;
use crate::models::{ConnectionAttempt, ConnectionDescriptor, ConnectionResult, FailureDetail, TestReport};
use crate::registry::Registry;
use crate::resolver::DriverResolver;
use crate::types::{Backend, BackendSelection, FailureKind};
use std::time::Instant;

/// Runs connection attempts through a fixed set of connectors
pub struct ConnectionTester {
    connectors: Vec<Box<dyn Connector>>,
    logger: Option<ConnectionLogger>,
}

impl ConnectionTester {
    /// Create a tester; connectors are kept in backend order
    pub fn new(mut connectors: Vec<Box<dyn Connector>>) -> Self {
        connectors.sort_by_key(|c| c.backend());
        Self { connectors, logger: None }
    }

    pub fn with_logger(mut self, logger: ConnectionLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Backends that can currently be attempted
    pub fn available_backends(&self) -> Vec<Backend> {
        self.connectors
            .iter()
            .filter(|c| c.is_available())
            .map(|c| c.backend())
            .collect()
    }

    /// Test one DSN.
    ///
    /// The DSN need not exist in the registry; the driver manager may still
    /// resolve it. A specific backend is always reported, as
    /// `BackendUnavailable` when it cannot run. With `All`, unavailable
    /// backends are skipped.
    pub async fn test(&self, registry: &Registry, attempt: &ConnectionAttempt) -> TestReport {
        let correlation_id = match &self.logger {
            Some(logger) => Some(logger.start_test(&attempt.dsn_name).await),
            None => None,
        };

        let dsn = registry.get_dsn(&attempt.dsn_name).ok();
        let advisory = dsn
            .as_ref()
            .and_then(|entry| DriverResolver::advise(entry, registry.driver_store()));

        if let (Some(logger), Some(advisory)) = (&self.logger, &advisory) {
            logger.log_advisory(advisory).await;
        }

        let descriptor = ConnectionDescriptor {
            dsn_name: attempt.dsn_name.clone(),
            credentials: attempt.credentials.clone(),
            timeout: attempt.timeout,
            dsn_file: Some(registry.dsn_path().to_path_buf()),
            driver_file: Some(registry.driver_path().to_path_buf()),
        };

        let mut results = Vec::new();
        for backend in self.backends_for(attempt.selection) {
            let result = self.attempt(backend, &descriptor, attempt.selection).await;
            if let Some(result) = result {
                if let Some(logger) = &self.logger {
                    logger.log_attempt_result(&result).await;
                }
                results.push(result);
            }
        }

        let report = TestReport {
            dsn_name: attempt.dsn_name.clone(),
            dsn_known: dsn.is_some(),
            advisory,
            results,
        };

        if let (Some(logger), Some(id)) = (&self.logger, correlation_id) {
            logger.end_test(&id, &attempt.dsn_name, report.overall_success()).await;
        }

        report
    }

    fn backends_for(&self, selection: BackendSelection) -> Vec<Backend> {
        match selection {
            BackendSelection::Specific(backend) => vec![backend],
            BackendSelection::All => Backend::ALL.to_vec(),
        }
    }

    /// One backend; `None` when the backend is skipped
    async fn attempt(
        &self,
        backend: Backend,
        descriptor: &ConnectionDescriptor,
        selection: BackendSelection,
    ) -> Option<ConnectionResult> {
        let connector = self
            .connectors
            .iter()
            .find(|c| c.backend() == backend && c.is_available());

        let Some(connector) = connector else {
            return match selection {
                BackendSelection::All => {
                    if let Some(logger) = &self.logger {
                        logger.log_skipped(backend).await;
                    }
                    None
                }
                BackendSelection::Specific(_) => Some(ConnectionResult::failure(
                    backend,
                    FailureDetail {
                        kind: FailureKind::BackendUnavailable,
                        sqlstate: None,
                        message: format!("{} is not installed ({} not found)", backend, backend.program()),
                    },
                    std::time::Duration::ZERO,
                )),
            };
        };

        if let Some(logger) = &self.logger {
            logger.log_attempt_start(backend, descriptor).await;
        }

        let started = Instant::now();
        let outcome = connector.connect(descriptor).await;
        let duration = started.elapsed();

        Some(match classify(&outcome) {
            None => ConnectionResult::success(backend, duration),
            Some(detail) => ConnectionResult::failure(backend, detail, duration),
        })
    }
}
