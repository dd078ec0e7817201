//! Typed views over DSN and driver sections

use crate::store::ConfigSection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Mask used for secrets in detail views
pub const MASKED_VALUE: &str = "********";

/// Keys read the same way wherever they appear.
///
/// Lookups go through every alias case-insensitively; the first matching key
/// in section order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownKey {
    Driver,
    Uid,
    Pwd,
    Description,
    Address,
    Database,
    Setup,
}

impl WellKnownKey {
    /// Spelling used when this crate writes the key
    pub fn canonical(&self) -> &'static str {
        match self {
            WellKnownKey::Driver => "Driver",
            WellKnownKey::Uid => "UID",
            WellKnownKey::Pwd => "PWD",
            WellKnownKey::Description => "Description",
            WellKnownKey::Address => "Address",
            WellKnownKey::Database => "Database",
            WellKnownKey::Setup => "Setup",
        }
    }

    /// Accepted spellings, compared without case
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            WellKnownKey::Driver => &["driver"],
            WellKnownKey::Uid => &["uid", "user", "username"],
            WellKnownKey::Pwd => &["pwd", "password"],
            WellKnownKey::Description => &["description"],
            WellKnownKey::Address => &["address"],
            WellKnownKey::Database => &["database"],
            WellKnownKey::Setup => &["setup"],
        }
    }

    /// Whether `key` is a spelling of this well-known key
    pub fn matches(&self, key: &str) -> bool {
        self.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(key))
    }

    /// Read this key from a section
    pub fn read<'a>(&self, section: &'a ConfigSection) -> Option<&'a str> {
        section.iter().find(|(key, _)| self.matches(key)).map(|(_, value)| value)
    }
}

impl fmt::Display for WellKnownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Whether a key holds a secret that must never be displayed
pub fn is_secret_key(key: &str) -> bool {
    WellKnownKey::Pwd.matches(key)
}

/// A named section from the DSN store.
///
/// Any key set is accepted; absent well-known keys read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsnEntry {
    pub name: String,
    pub section: ConfigSection,
}

impl DsnEntry {
    pub fn new<S: Into<String>>(name: S, section: ConfigSection) -> Self {
        Self { name: name.into(), section }
    }

    fn field(&self, key: WellKnownKey) -> &str {
        key.read(&self.section).unwrap_or("")
    }

    /// Driver reference: a registered driver name, or a misconfigured library path
    pub fn driver(&self) -> &str {
        self.field(WellKnownKey::Driver)
    }

    pub fn address(&self) -> &str {
        self.field(WellKnownKey::Address)
    }

    pub fn database(&self) -> &str {
        self.field(WellKnownKey::Database)
    }

    pub fn description(&self) -> &str {
        self.field(WellKnownKey::Description)
    }

    pub fn username(&self) -> &str {
        self.field(WellKnownKey::Uid)
    }

    pub fn password(&self) -> &str {
        self.field(WellKnownKey::Pwd)
    }

    /// Key/value pairs in file order with secrets replaced by [`MASKED_VALUE`]
    pub fn masked_fields(&self) -> Vec<(String, String)> {
        self.section
            .iter()
            .map(|(key, value)| {
                let shown = if is_secret_key(key) { MASKED_VALUE } else { value };
                (key.to_string(), shown.to_string())
            })
            .collect()
    }
}

/// A named section from the driver store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverEntry {
    pub name: String,
    pub section: ConfigSection,
}

impl DriverEntry {
    pub fn new<S: Into<String>>(name: S, section: ConfigSection) -> Self {
        Self { name: name.into(), section }
    }

    /// Library path; stored under the `Driver` key in the driver store
    pub fn library(&self) -> Option<&str> {
        WellKnownKey::Driver.read(&self.section).filter(|v| !v.is_empty())
    }

    pub fn setup(&self) -> Option<&str> {
        WellKnownKey::Setup.read(&self.section).filter(|v| !v.is_empty())
    }

    pub fn description(&self) -> &str {
        WellKnownKey::Description.read(&self.section).unwrap_or("")
    }

    pub fn threading(&self) -> Option<u32> {
        self.numeric("Threading")
    }

    pub fn usage_count(&self) -> Option<u32> {
        self.numeric("UsageCount")
    }

    fn numeric(&self, key: &str) -> Option<u32> {
        self.section.get_ignore_case(key).and_then(|v| v.trim().parse().ok())
    }

    /// Whether the library path points at an existing file
    pub fn library_exists(&self) -> bool {
        self.library().map(|p| Path::new(p).is_file()).unwrap_or(false)
    }
}

/// OpenLink connection settings appended to new DSNs by default
pub const OPENLINK_DEFAULTS: &[(&str, &str)] = &[
    ("WideAsUTF16", "Yes"),
    ("Daylight", "Yes"),
    ("RoundRobin", "No"),
    ("NoSystemTables", "No"),
    ("TreatViewsAsTables", "No"),
    ("PwdClearText", "0"),
];

/// Field set for a new DSN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsnTemplate {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub description: Option<String>,
    pub openlink_defaults: bool,
}

impl DsnTemplate {
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 1111;
    pub const DEFAULT_DATABASE: &'static str = "DB";
    pub const DEFAULT_USERNAME: &'static str = "dba";
    pub const DEFAULT_PASSWORD: &'static str = "dba";

    pub fn new<S: Into<String>>(driver: S) -> Self {
        Self {
            driver: driver.into(),
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            database: Self::DEFAULT_DATABASE.to_string(),
            username: Self::DEFAULT_USERNAME.to_string(),
            password: Self::DEFAULT_PASSWORD.to_string(),
            description: None,
            openlink_defaults: true,
        }
    }

    /// Build the section stored under `name`
    pub fn to_section(&self, name: &str) -> ConfigSection {
        let description = self
            .description
            .clone()
            .unwrap_or_else(|| format!("{} DSN", name));

        let mut section = ConfigSection::new()
            .with(WellKnownKey::Description.canonical(), description)
            .with(WellKnownKey::Driver.canonical(), self.driver.as_str())
            .with(WellKnownKey::Address.canonical(), format!("{}:{}", self.host, self.port))
            .with(WellKnownKey::Database.canonical(), self.database.as_str())
            .with(WellKnownKey::Uid.canonical(), self.username.as_str())
            .with(WellKnownKey::Pwd.canonical(), self.password.as_str());

        if self.openlink_defaults {
            for (key, value) in OPENLINK_DEFAULTS {
                section.insert(*key, *value);
            }
        }

        section
    }
}

/// Field set for a new driver registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverTemplate {
    pub library: String,
    pub setup: Option<String>,
    pub description: Option<String>,
}

impl DriverTemplate {
    pub fn new<S: Into<String>>(library: S) -> Self {
        Self { library: library.into(), setup: None, description: None }
    }

    pub fn to_section(&self, name: &str) -> ConfigSection {
        let description = self
            .description
            .clone()
            .unwrap_or_else(|| format!("{} ODBC Driver", name));
        let setup = self.setup.clone().unwrap_or_else(|| self.library.clone());

        ConfigSection::new()
            .with(WellKnownKey::Description.canonical(), description)
            .with(WellKnownKey::Driver.canonical(), self.library.as_str())
            .with(WellKnownKey::Setup.canonical(), setup)
            .with("Threading", "1")
            .with("UsageCount", "1")
    }
}
