// src/core/wordlist.rs

use crate::config::{is_valid_hostname, WordlistSource};
use crate::errors::ConfigError;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Labels tried when no wordlist file is available.
pub const BUILTIN_LABELS: &[&str] = &["www", "mail", "ftp", "test", "dev", "staging"];

/// Loads the candidate labels for a scan.
///
/// A missing file at the default location falls back to [`BUILTIN_LABELS`];
/// an explicitly configured file must be readable.
pub fn load_candidates(source: &WordlistSource) -> Result<Vec<String>, ConfigError> {
    match source {
        WordlistSource::Explicit(path) => read_wordlist(path),
        WordlistSource::Default(path) => match read_wordlist(path) {
            Err(ConfigError::Wordlist { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "Wordlist not found, using the built-in list.");
                Ok(builtin_candidates())
            }
            other => other,
        },
    }
}

pub fn builtin_candidates() -> Vec<String> {
    BUILTIN_LABELS.iter().map(|s| s.to_string()).collect()
}

fn read_wordlist(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Wordlist {
        path: path.to_path_buf(),
        source,
    })?;
    let labels = parse_wordlist(&content);
    info!(path = %path.display(), count = labels.len(), "Wordlist loaded.");
    Ok(labels)
}

/// One label per line. Blank lines and malformed labels are skipped and
/// repeated labels are kept only at their first position.
pub fn parse_wordlist(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for line in content.lines() {
        let label = line.trim().trim_matches('.').to_ascii_lowercase();
        if label.is_empty() {
            continue;
        }
        if !is_valid_hostname(&label) {
            debug!(line = %line.trim(), "Skipping malformed wordlist entry.");
            continue;
        }
        if seen.insert(label.clone()) {
            labels.push(label);
        }
    }
    labels
}
