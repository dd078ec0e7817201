//! Configuration management module

pub mod env;
pub mod locator;
pub mod parser;
pub mod validation;

// Re-export main functionality
pub use env::EnvManager;
pub use locator::{FileLocator, PathSource, StorePaths};
pub use parser::{display_config_summary, load_config, ConfigParser};
pub use validation::{ConfigValidator, RegistryValidator, ValidationLevel, ValidationWarning};

// Re-export from models for convenience
pub use crate::models::Config;
