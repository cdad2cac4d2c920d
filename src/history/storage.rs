//! Persistent storage for request history.
//!
//! Entries are stored one JSON object per line (JSONL), so appending is
//! cheap and a corrupted line only loses that entry.

use super::models::{HistoryEntry, HistoryError};
use crate::config::get_config;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Name of the history file.
pub const HISTORY_FILE_NAME: &str = "history.jsonl";

/// Configuration for history storage.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of entries to keep.
    pub max_entries: usize,
}

impl HistoryConfig {
    /// Reads the limit from the global configuration.
    pub fn from_global_config() -> Self {
        Self {
            max_entries: get_config().history_limit,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::from_global_config()
    }
}

/// Appends a sanitized entry and trims the file to `config.max_entries`.
pub fn save_entry(path: &Path, entry: &HistoryEntry, config: &HistoryConfig) -> Result<(), HistoryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string(&entry.sanitized())?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;
    file.flush()?;

    maintain_history_limit(path, config.max_entries)
}

/// Loads every readable entry, oldest first.
///
/// Corrupted lines are skipped with a warning.
pub fn load_history(path: &Path) -> Result<Vec<HistoryEntry>, HistoryError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Error reading history line {}: {}", line_num + 1, e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<HistoryEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("Skipping corrupted history entry at line {}: {}", line_num + 1, e),
        }
    }

    Ok(entries)
}

/// Finds an entry by id.
pub fn find_entry(path: &Path, id: &str) -> Result<Option<HistoryEntry>, HistoryError> {
    Ok(load_history(path)?.into_iter().find(|entry| entry.id == id))
}

/// Drops the oldest entries beyond `max_entries`.
pub fn maintain_history_limit(path: &Path, max_entries: usize) -> Result<(), HistoryError> {
    let entries = load_history(path)?;
    if entries.len() <= max_entries {
        return Ok(());
    }

    let keep = &entries[entries.len() - max_entries..];
    let mut content = String::new();
    for entry in keep {
        content.push_str(&serde_json::to_string(entry)?);
        content.push('\n');
    }

    let temp_path = path.with_extension("jsonl.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Deletes the history file.
pub fn clear_history(path: &Path) -> Result<(), HistoryError> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::REDACTED;
    use crate::models::{ExecutionResult, HttpMethod, ParsedRequest, Timing};
    use serde_json::Map;
    use tempfile::TempDir;

    fn entry(url: &str) -> HistoryEntry {
        let mut request = ParsedRequest::new(HttpMethod::GET, url);
        request.add_header("Authorization", "Bearer secret");
        let result = ExecutionResult::transport_failure("refused", Timing::Millis(1));
        HistoryEntry::new(request, &result, Map::new())
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(HISTORY_FILE_NAME);
        let config = HistoryConfig { max_entries: 10 };

        save_entry(&path, &entry("https://a.test/1"), &config).unwrap();
        save_entry(&path, &entry("https://a.test/2"), &config).unwrap();

        let entries = load_history(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].request.url, "https://a.test/1");
        assert_eq!(entries[0].request.headers["Authorization"], REDACTED);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("Bearer secret"));
    }

    #[test]
    fn test_limit_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        let config = HistoryConfig { max_entries: 2 };

        for i in 0..4 {
            save_entry(&path, &entry(&format!("https://a.test/{}", i)), &config).unwrap();
        }

        let entries = load_history(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].request.url, "https://a.test/2");
        assert_eq!(entries[1].request.url, "https://a.test/3");
    }

    #[test]
    fn test_corrupted_lines_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        let config = HistoryConfig { max_entries: 10 };

        let first = entry("https://a.test/1");
        save_entry(&path, &first, &config).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        let entries = load_history(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(find_entry(&path, &first.id).unwrap().is_some());
        assert!(find_entry(&path, "missing").unwrap().is_none());
    }

    #[test]
    fn test_clear_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        assert!(load_history(&path).unwrap().is_empty());

        save_entry(&path, &entry("https://a.test/"), &HistoryConfig { max_entries: 5 }).unwrap();
        clear_history(&path).unwrap();
        assert!(!path.exists());
        clear_history(&path).unwrap();
    }
}
