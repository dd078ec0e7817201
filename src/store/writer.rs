//! Serialization of a store back to file grammar

use super::ConfigStore;
use crate::error::{AppError, Result};
use std::path::Path;

/// Render a store: reserved meta blocks first, then sections in insertion
/// order, one `key = value` per line and one blank line between blocks.
pub fn serialize(store: &ConfigStore) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(store.reserved_blocks().len() + store.len());

    for block in store.reserved_blocks() {
        let mut out = format!("[{}]\n", block.name);
        for line in &block.lines {
            out.push_str(line);
            out.push('\n');
        }
        blocks.push(out);
    }

    for (name, section) in store.sections() {
        let mut out = format!("[{}]\n", name);
        for (key, value) in section.iter() {
            out.push_str(&format!("{} = {}\n", key, value));
        }
        blocks.push(out);
    }

    blocks.join("\n")
}

/// Write text to `path`, creating missing parent directories
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
        }
    }

    std::fs::write(path, contents).map_err(|e| write_error(path, e))
}

/// Permission failures map to `PermissionDenied`, everything else to `Io`
fn write_error(path: &Path, error: std::io::Error) -> AppError {
    let message = format!("{}: {}", path.display(), error);
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => AppError::permission_denied(message),
        _ => AppError::io(message),
    }
}
