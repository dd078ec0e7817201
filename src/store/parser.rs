//! Line-oriented parser for the store grammar

use super::{
    is_reserved_name, ConfigSection, ConfigStore, ParseOutcome, ParseWarning, ParseWarningKind,
    ReservedBlock, DUPLICATE_SUFFIX_SEPARATOR,
};

/// Where key lines currently go
enum Target {
    None,
    Section(String),
    Reserved(usize),
}

/// Parse raw text into a best-effort store.
///
/// Malformed lines are skipped and reported; parsing itself never fails.
pub fn parse(text: &str) -> ParseOutcome {
    let mut store = ConfigStore::new();
    let mut warnings = Vec::new();
    let mut target = Target::None;

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') || line.len() < 2 {
                warnings.push(ParseWarning {
                    line: line_number,
                    kind: ParseWarningKind::UnterminatedHeader { text: line.to_string() },
                });
                target = Target::None;
                continue;
            }

            let name = line[1..line.len() - 1].trim();

            if is_reserved_name(name) {
                let index = store.push_reserved(ReservedBlock { name: name.to_string(), lines: Vec::new() });
                target = Target::Reserved(index);
                continue;
            }

            let unique = unique_name(&store, name);
            if unique != name {
                warnings.push(ParseWarning {
                    line: line_number,
                    kind: ParseWarningKind::DuplicateSection {
                        original: name.to_string(),
                        renamed: unique.clone(),
                    },
                });
            }

            store.insert_parsed(unique.clone(), ConfigSection::new());
            target = Target::Section(unique);
            continue;
        }

        match &target {
            Target::Reserved(index) => {
                if let Some(block) = store.reserved_mut(*index) {
                    block.lines.push(line.to_string());
                }
            }
            Target::Section(name) => match line.split_once('=') {
                Some((key, value)) => {
                    if let Some(section) = store.section_mut(name) {
                        section.insert(key.trim(), value.trim());
                    }
                }
                None => warnings.push(ParseWarning {
                    line: line_number,
                    kind: ParseWarningKind::UnrecognizedLine { text: line.to_string() },
                }),
            },
            Target::None => {
                let kind = if line.contains('=') {
                    ParseWarningKind::OrphanEntry { text: line.to_string() }
                } else {
                    ParseWarningKind::UnrecognizedLine { text: line.to_string() }
                };
                warnings.push(ParseWarning { line: line_number, kind });
            }
        }
    }

    ParseOutcome { store, warnings }
}

/// `Name`, then `Name__1`, `Name__2`, ... until unused
fn unique_name(store: &ConfigStore, name: &str) -> String {
    if !store.contains_section(name) {
        return name.to_string();
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{}{}{}", name, DUPLICATE_SUFFIX_SEPARATOR, counter);
        if !store.contains_section(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
