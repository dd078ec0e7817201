//! Data models for configuration, store entries and connection tests

pub mod config;
pub mod entries;
pub mod result;

pub use config::Config;
pub use entries::{DriverEntry, DriverTemplate, DsnEntry, DsnTemplate, WellKnownKey, MASKED_VALUE};
pub use result::{
    ConnectionAttempt, ConnectionDescriptor, ConnectionResult, Credentials, DriverAdvisory,
    FailureDetail, TestReport,
};
