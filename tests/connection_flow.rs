//! Connection test flow through the public API with scripted driver managers

use async_trait::async_trait;
use odbc_dsn_manager::{
    models::{ConnectionAttempt, ConnectionDescriptor, Credentials},
    store::ConfigStore,
    tester::{Connector, ConnectorOutcome, ConnectionTester},
    Backend, BackendSelection, FailureKind, Registry,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Connector that replays a fixed outcome and records what it was asked
struct ScriptedManager {
    backend: Backend,
    installed: bool,
    outcome: ConnectorOutcome,
    calls: Arc<Mutex<Vec<ConnectionDescriptor>>>,
}

#[async_trait]
impl Connector for ScriptedManager {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn is_available(&self) -> bool {
        self.installed
    }

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> ConnectorOutcome {
        self.calls.lock().unwrap().push(descriptor.clone());
        self.outcome.clone()
    }
}

fn manager(
    backend: Backend,
    installed: bool,
    outcome: ConnectorOutcome,
    calls: &Arc<Mutex<Vec<ConnectionDescriptor>>>,
) -> Box<dyn Connector> {
    Box::new(ScriptedManager { backend, installed, outcome, calls: Arc::clone(calls) })
}

fn registry() -> Registry {
    let dsns = ConfigStore::parse(
        "[Sales]\nDriver = OpenLink Lite\n\n[Legacy]\nDriver = /opt/openlink/lib/oplodbc.so\n",
    )
    .store;
    let drivers = ConfigStore::parse("[OpenLink Lite]\nDriver = /opt/openlink/lib/oplodbc.so\n").store;
    Registry::from_stores(PathBuf::from("/tmp/odbc.ini"), dsns, PathBuf::from("/tmp/odbcinst.ini"), drivers)
}

fn failed(message: &str) -> ConnectorOutcome {
    ConnectorOutcome::Failed { message: message.to_string() }
}

#[tokio::test]
async fn test_one_backend_success_is_overall_success() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![
        manager(Backend::IOdbc, true, ConnectorOutcome::Success, &calls),
        manager(
            Backend::UnixOdbc,
            true,
            failed("[IM002][unixODBC][Driver Manager]Data source name not found"),
            &calls,
        ),
    ]);

    let attempt = ConnectionAttempt::new("Sales", BackendSelection::All, Duration::from_secs(5));
    let report = tester.test(&registry(), &attempt).await;

    assert!(report.overall_success());
    assert!(report.dsn_known);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].backend, Backend::UnixOdbc);
    assert_eq!(report.results[0].failure_kind(), Some(FailureKind::DriverNotFound));
    assert_eq!(report.results[1].backend, Backend::IOdbc);
    assert!(report.results[1].is_success());
}

#[tokio::test]
async fn test_descriptor_carries_store_paths_and_credentials() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![manager(Backend::UnixOdbc, true, ConnectorOutcome::Success, &calls)]);

    let attempt = ConnectionAttempt::new("Sales", BackendSelection::Specific(Backend::UnixOdbc), Duration::from_secs(7))
        .with_credentials(Credentials::new(Some("scott"), Some("tiger")));
    tester.test(&registry(), &attempt).await;

    let seen = calls.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].dsn_name, "Sales");
    assert_eq!(seen[0].timeout, Duration::from_secs(7));
    assert_eq!(seen[0].dsn_file, Some(PathBuf::from("/tmp/odbc.ini")));
    assert_eq!(seen[0].driver_file, Some(PathBuf::from("/tmp/odbcinst.ini")));
    assert_eq!(seen[0].credentials.as_ref().map(|c| c.username.as_str()), Some("scott"));
}

#[tokio::test]
async fn test_uninstalled_backends_skipped_under_all() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![
        manager(Backend::UnixOdbc, false, ConnectorOutcome::Success, &calls),
        manager(Backend::IOdbc, false, ConnectorOutcome::Success, &calls),
    ]);

    let attempt = ConnectionAttempt::new("Sales", BackendSelection::All, Duration::from_secs(5));
    let report = tester.test(&registry(), &attempt).await;

    assert!(report.results.is_empty());
    assert!(!report.overall_success());
    assert!(calls.lock().unwrap().is_empty());
    assert!(tester.available_backends().is_empty());
}

#[tokio::test]
async fn test_specific_uninstalled_backend_reported() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![manager(Backend::UnixOdbc, true, ConnectorOutcome::Success, &calls)]);

    let attempt = ConnectionAttempt::new("Sales", BackendSelection::Specific(Backend::IOdbc), Duration::from_secs(5));
    let report = tester.test(&registry(), &attempt).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].backend, Backend::IOdbc);
    assert_eq!(report.results[0].failure_kind(), Some(FailureKind::BackendUnavailable));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failures_are_classified() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![
        manager(Backend::UnixOdbc, true, failed("[28000][unixODBC]Invalid authorization"), &calls),
        manager(Backend::IOdbc, true, ConnectorOutcome::TimedOut { after: Duration::from_secs(2) }, &calls),
    ]);

    let attempt = ConnectionAttempt::new("Sales", BackendSelection::All, Duration::from_secs(2));
    let report = tester.test(&registry(), &attempt).await;

    assert!(!report.overall_success());
    let kinds: Vec<_> = report.results.iter().map(|r| r.failure_kind()).collect();
    assert_eq!(kinds, vec![Some(FailureKind::AuthenticationRejected), Some(FailureKind::Timeout)]);
    assert_eq!(
        report.results[0].failure.as_ref().and_then(|f| f.sqlstate.as_deref()),
        Some("28000")
    );
}

#[tokio::test]
async fn test_path_driver_advisory_attached() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![manager(
        Backend::UnixOdbc,
        true,
        failed("[IM003][unixODBC]Specified driver could not be loaded"),
        &calls,
    )]);

    let attempt = ConnectionAttempt::new("Legacy", BackendSelection::All, Duration::from_secs(5));
    let report = tester.test(&registry(), &attempt).await;

    let advisory = report.advisory.expect("advisory expected");
    assert_eq!(advisory.suggested_driver.as_deref(), Some("OpenLink Lite"));
    assert_eq!(report.results[0].failure_kind(), Some(FailureKind::DriverLoadFailed));
}

#[tokio::test]
async fn test_unknown_dsn_still_attempted() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let tester = ConnectionTester::new(vec![manager(Backend::UnixOdbc, true, ConnectorOutcome::Success, &calls)]);

    let attempt = ConnectionAttempt::new("SystemWide", BackendSelection::All, Duration::from_secs(5));
    let report = tester.test(&registry(), &attempt).await;

    assert!(!report.dsn_known);
    assert!(report.advisory.is_none());
    assert!(report.overall_success());
    assert_eq!(calls.lock().unwrap().len(), 1);
}
