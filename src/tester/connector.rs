//! Connector abstraction over ODBC driver managers

use crate::models::ConnectionDescriptor;
use crate::types::Backend;
use async_trait::async_trait;
use std::time::Duration;

/// Raw outcome of one connection attempt, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorOutcome {
    /// Connected and the round-trip query returned
    Success,
    /// The driver manager reported an error
    Failed {
        /// Combined diagnostic output, verbatim
        message: String,
    },
    /// No answer within the descriptor timeout
    TimedOut { after: Duration },
    /// The backend could not be started at all
    Unavailable { message: String },
}

/// Driver manager seam used by the connection tester
#[async_trait]
pub trait Connector: Send + Sync {
    /// Backend this connector drives
    fn backend(&self) -> Backend;

    /// Whether the backend is installed and can be attempted
    fn is_available(&self) -> bool;

    /// Connect, run a trivial query, and report the raw outcome.
    ///
    /// Implementations apply `descriptor.timeout` as given.
    async fn connect(&self, descriptor: &ConnectionDescriptor) -> ConnectorOutcome;
}
