//! Connectors that drive the command-line test programs of each driver manager

use super::connector::{Connector, ConnectorOutcome};
use crate::models::ConnectionDescriptor;
use crate::types::Backend;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Finds driver manager programs on a search path
#[derive(Debug, Clone)]
pub struct BackendDetector {
    search_path: Option<OsString>,
}

impl BackendDetector {
    /// Search the process `PATH`
    pub fn from_env() -> Self {
        Self { search_path: std::env::var_os("PATH") }
    }

    /// Search an explicit `PATH`-style list
    pub fn with_search_path<S: Into<OsString>>(search_path: S) -> Self {
        Self { search_path: Some(search_path.into()) }
    }

    /// Full path of `program`, if any search directory holds it
    pub fn find_program(&self, program: &str) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }

    /// Program path per backend, in attempt order
    pub fn detect(&self) -> Vec<(Backend, Option<PathBuf>)> {
        Backend::ALL
            .iter()
            .map(|backend| (*backend, self.find_program(backend.program())))
            .collect()
    }

    /// One connector per backend, available or not
    pub fn connectors(&self) -> Vec<Box<dyn Connector>> {
        self.detect()
            .into_iter()
            .map(|(backend, program)| Box::new(ProcessConnector::new(backend, program)) as Box<dyn Connector>)
            .collect()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs `isql` or `iodbctest` as a child process
#[derive(Debug, Clone)]
pub struct ProcessConnector {
    backend: Backend,
    program: Option<PathBuf>,
}

impl ProcessConnector {
    pub fn new(backend: Backend, program: Option<PathBuf>) -> Self {
        Self { backend, program }
    }

    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    /// Command-line arguments for one attempt
    pub fn arguments(&self, descriptor: &ConnectionDescriptor) -> Vec<String> {
        match self.backend {
            Backend::UnixOdbc => {
                let mut args = vec!["-b".to_string(), "-v".to_string(), descriptor.dsn_name.clone()];
                if let Some(credentials) = &descriptor.credentials {
                    args.push(credentials.username.clone());
                    args.push(credentials.password.clone());
                }
                args
            }
            Backend::IOdbc => vec![descriptor.connection_string()],
        }
    }

    /// Text written to the child's stdin
    pub fn script(&self) -> &'static str {
        match self.backend {
            Backend::UnixOdbc => "SELECT 1\n",
            Backend::IOdbc => "SELECT 1\nquit\n",
        }
    }

    /// Output fragments that mean the attempt failed even on a zero exit status
    fn failure_markers(&self) -> &'static [&'static str] {
        match self.backend {
            Backend::UnixOdbc => &["[ISQL]ERROR"],
            Backend::IOdbc => &["SQLSTATE=", "SQLDriverConnect ="],
        }
    }

    fn interpret(&self, succeeded: bool, stdout: &str, stderr: &str) -> ConnectorOutcome {
        let combined = [stderr.trim(), stdout.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");

        let flagged = self.failure_markers().iter().any(|marker| combined.contains(marker));

        if succeeded && !flagged {
            ConnectorOutcome::Success
        } else if combined.is_empty() {
            ConnectorOutcome::Failed {
                message: format!("{} exited without diagnostics", self.backend.program()),
            }
        } else {
            ConnectorOutcome::Failed { message: combined }
        }
    }
}

#[async_trait]
impl Connector for ProcessConnector {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    async fn connect(&self, descriptor: &ConnectionDescriptor) -> ConnectorOutcome {
        let Some(program) = &self.program else {
            return ConnectorOutcome::Unavailable {
                message: format!("{} was not found on PATH", self.backend.program()),
            };
        };

        let mut command = Command::new(program);
        command
            .args(self.arguments(descriptor))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Point the driver manager at the stores in use; the child's
        // environment only.
        if let Some(dsn_file) = &descriptor.dsn_file {
            command.env("ODBCINI", dsn_file);
        }
        if let Some(driver_file) = &descriptor.driver_file {
            command.env("ODBCINST", driver_file);
            command.env("ODBCINSTINI", driver_file);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ConnectorOutcome::Unavailable {
                    message: format!("Failed to start {}: {}", program.display(), e),
                }
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits early closes the pipe; its output explains why.
            let _ = stdin.write_all(self.script().as_bytes()).await;
        }

        match timeout(descriptor.timeout, child.wait_with_output()).await {
            Err(_) => ConnectorOutcome::TimedOut { after: descriptor.timeout },
            Ok(Err(e)) => ConnectorOutcome::Failed {
                message: format!("Failed to collect {} output: {}", self.backend.program(), e),
            },
            Ok(Ok(output)) => self.interpret(
                output.status.success(),
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credentials;
    use std::time::Duration;
    use tempfile::TempDir;

    fn descriptor(credentials: Option<Credentials>) -> ConnectionDescriptor {
        ConnectionDescriptor {
            dsn_name: "Sales".into(),
            credentials,
            timeout: Duration::from_secs(5),
            dsn_file: None,
            driver_file: None,
        }
    }

    #[test]
    fn test_isql_arguments() {
        let connector = ProcessConnector::new(Backend::UnixOdbc, None);
        assert_eq!(connector.arguments(&descriptor(None)), vec!["-b", "-v", "Sales"]);
        assert_eq!(
            connector.arguments(&descriptor(Credentials::new(Some("scott"), Some("tiger")))),
            vec!["-b", "-v", "Sales", "scott", "tiger"]
        );
    }

    #[test]
    fn test_iodbctest_arguments() {
        let connector = ProcessConnector::new(Backend::IOdbc, None);
        assert_eq!(connector.arguments(&descriptor(None)), vec!["DSN=Sales"]);
        assert_eq!(
            connector.arguments(&descriptor(Credentials::new(Some("scott"), Some("tiger")))),
            vec!["DSN=Sales;UID=scott;PWD=tiger"]
        );
        assert!(connector.script().ends_with("quit\n"));
    }

    #[test]
    fn test_interpret_output() {
        let isql = ProcessConnector::new(Backend::UnixOdbc, None);
        assert_eq!(isql.interpret(true, "+---+\n| 1 |\n", ""), ConnectorOutcome::Success);
        assert!(matches!(
            isql.interpret(false, "", "[IM002][unixODBC][Driver Manager]Data source name not found\n[ISQL]ERROR: Could not SQLConnect"),
            ConnectorOutcome::Failed { .. }
        ));
        assert!(matches!(isql.interpret(false, "", ""), ConnectorOutcome::Failed { .. }));

        let iodbc = ProcessConnector::new(Backend::IOdbc, None);
        assert!(matches!(
            iodbc.interpret(true, "1: SQLDriverConnect = [iODBC][Driver Manager]Data source name not found (0) SQLSTATE=IM002", ""),
            ConnectorOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let connector = ProcessConnector::new(Backend::UnixOdbc, None);
        assert!(!connector.is_available());
        assert!(matches!(
            connector.connect(&descriptor(None)).await,
            ConnectorOutcome::Unavailable { .. }
        ));
    }

    #[test]
    fn test_detector_with_empty_search_path() {
        let dir = TempDir::new().unwrap();
        let detector = BackendDetector::with_search_path(dir.path());
        let detected = detector.detect();
        assert_eq!(detected.len(), 2);
        assert!(detected.iter().all(|(_, program)| program.is_none()));
        assert!(detector.connectors().iter().all(|c| !c.is_available()));
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_detector_finds_executables() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "isql", "exit 0");
        std::fs::write(dir.path().join("iodbctest"), "not executable").unwrap();

        let detector = BackendDetector::with_search_path(dir.path());
        assert!(detector.find_program("isql").is_some());
        assert!(detector.find_program("iodbctest").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_success_and_env() {
        let dir = TempDir::new().unwrap();
        let program = write_script(
            dir.path(),
            "isql",
            "cat > /dev/null\n[ \"$ODBCINI\" = \"/tmp/custom.ini\" ] || { echo \"[ISQL]ERROR: wrong ini\" >&2; exit 1; }\necho ok",
        );

        let connector = ProcessConnector::new(Backend::UnixOdbc, Some(program));
        let mut with_file = descriptor(None);
        with_file.dsn_file = Some(PathBuf::from("/tmp/custom.ini"));

        assert_eq!(connector.connect(&with_file).await, ConnectorOutcome::Success);
        assert!(matches!(connector.connect(&descriptor(None)).await, ConnectorOutcome::Failed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_timeout() {
        let dir = TempDir::new().unwrap();
        let program = write_script(dir.path(), "isql", "sleep 5");

        let connector = ProcessConnector::new(Backend::UnixOdbc, Some(program));
        let mut slow = descriptor(None);
        slow.timeout = Duration::from_millis(200);

        assert_eq!(
            connector.connect(&slow).await,
            ConnectorOutcome::TimedOut { after: Duration::from_millis(200) }
        );
    }
}
