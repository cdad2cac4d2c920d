//! Request history.
//!
//! Every HTTP cell execution is recorded as a [`HistoryEntry`]. Entries can
//! be appended to a JSONL file; sensitive values are redacted before
//! anything reaches disk. Entries are also the source of request templates
//! for group execution.

pub mod models;
pub mod storage;

pub use models::{
    is_sensitive_header, is_sensitive_variable, HistoryEntry, HistoryError, REDACTED,
    SENSITIVE_HEADERS,
};
pub use storage::{
    clear_history, find_entry, load_history, maintain_history_limit,
    save_entry, HistoryConfig, HISTORY_FILE_NAME,
};
