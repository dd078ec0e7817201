//! Section-based configuration store
//!
//! Both `odbc.ini` and `odbcinst.ini` share one INI-like grammar: `[Name]`
//! headers, `key = value` lines, `#`/`;` comments. A [`ConfigStore`] keeps
//! sections in file order, renames duplicated section names instead of
//! merging them, and sets manager meta headers aside so they never show up
//! as DSNs or drivers.

mod parser;
mod writer;

pub use parser::parse;
pub use writer::serialize;

use crate::error::{AppError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Meta headers written by driver managers; they carry no DSN or driver data
pub const RESERVED_SECTION_NAMES: &[&str] = &["ODBC Data Sources", "ODBC Drivers", "ODBC"];

/// Separator inserted between a duplicated section name and its counter
pub const DUPLICATE_SUFFIX_SEPARATOR: &str = "__";

/// Check whether a section name is one of the reserved meta headers
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_SECTION_NAMES.contains(&name)
}

/// One `[Name]` block: ordered key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    entries: IndexMap<String, String>,
}

impl ConfigSection {
    /// Create an empty section
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Case-insensitive lookup, first matching key in insertion order
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite a value, keeping the key's original position
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove a key, preserving the order of the remaining ones
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate key/value pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigSection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut section = ConfigSection::new();
        for (key, value) in iter {
            section.insert(key, value);
        }
        section
    }
}

/// A reserved meta header and its raw body lines, kept only so that
/// rewriting a file does not drop them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedBlock {
    pub name: String,
    pub lines: Vec<String>,
}

/// Ordered mapping from unique section name to section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigStore {
    sections: IndexMap<String, ConfigSection>,
    reserved: Vec<ReservedBlock>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw text into a store plus accumulated warnings; never fails
    pub fn parse(text: &str) -> ParseOutcome {
        parser::parse(text)
    }

    /// Load a store from disk.
    ///
    /// A missing file yields an empty store with no warnings. Any other read
    /// failure (permissions, a directory, invalid UTF-8) is an `Io` error.
    pub fn load(path: &Path) -> Result<ParseOutcome> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(parser::parse(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ParseOutcome::default()),
            Err(e) => Err(AppError::io(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    /// Render the store in file grammar
    pub fn serialize(&self) -> String {
        writer::serialize(self)
    }

    /// Write the serialized store to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        writer::write_file(path, &self.serialize())
    }

    /// Upsert a whole section.
    ///
    /// An existing section is removed first and the new content appended,
    /// so no field of the prior section survives. Returns the prior section.
    pub fn add_or_replace_section<S: Into<String>>(&mut self, name: S, section: ConfigSection) -> Option<ConfigSection> {
        let name = name.into();
        let previous = self.sections.shift_remove(&name);
        self.sections.insert(name, section);
        previous
    }

    /// Remove a section, keeping the order of the others
    pub fn remove_section(&mut self, name: &str) -> Option<ConfigSection> {
        self.sections.shift_remove(name)
    }

    /// Exact-match lookup by section name
    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.get(name)
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Section names in insertion order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Sections in insertion order
    pub fn sections(&self) -> impl Iterator<Item = (&str, &ConfigSection)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Reserved meta headers seen while parsing
    pub fn reserved_blocks(&self) -> &[ReservedBlock] {
        &self.reserved
    }

    pub(crate) fn insert_parsed(&mut self, name: String, section: ConfigSection) {
        self.sections.insert(name, section);
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> Option<&mut ConfigSection> {
        self.sections.get_mut(name)
    }

    pub(crate) fn push_reserved(&mut self, block: ReservedBlock) -> usize {
        self.reserved.push(block);
        self.reserved.len() - 1
    }

    pub(crate) fn reserved_mut(&mut self, index: usize) -> Option<&mut ReservedBlock> {
        self.reserved.get_mut(index)
    }
}

/// Result of parsing one file
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub store: ConfigStore,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Something the parser skipped or repaired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseWarningKind {
    /// A section name was seen again and renamed
    DuplicateSection { original: String, renamed: String },
    /// `key = value` with no open section
    OrphanEntry { text: String },
    /// `[Name` without the closing bracket
    UnterminatedHeader { text: String },
    /// Neither a header, a comment, nor a `key = value` line
    UnrecognizedLine { text: String },
}

/// A warning tied to the 1-based line it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub line: usize,
    pub kind: ParseWarningKind,
}

impl ParseWarning {
    pub fn is_duplicate(&self) -> bool {
        matches!(self.kind, ParseWarningKind::DuplicateSection { .. })
    }

    /// The taxonomy error this warning corresponds to
    pub fn to_error(&self) -> AppError {
        match self.kind {
            ParseWarningKind::DuplicateSection { .. } => AppError::duplicate_section(self.to_string()),
            _ => AppError::malformed_input(self.to_string()),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseWarningKind::DuplicateSection { original, renamed } => {
                write!(f, "line {}: duplicate section '{}' renamed to '{}'", self.line, original, renamed)
            }
            ParseWarningKind::OrphanEntry { text } => {
                write!(f, "line {}: entry outside of any section skipped: {}", self.line, text)
            }
            ParseWarningKind::UnterminatedHeader { text } => {
                write!(f, "line {}: unterminated section header skipped: {}", self.line, text)
            }
            ParseWarningKind::UnrecognizedLine { text } => {
                write!(f, "line {}: unrecognized line skipped: {}", self.line, text)
            }
        }
    }
}
