//! Document-scoped secret store and credential masking.
//!
//! Request documents generated for an environment show secret-derived header
//! values (bearer tokens, API keys, basic credentials) only in masked form.
//! The real values live in a [`SecretStore`] keyed by the document URI and
//! never in the document text that may be saved. Revealing a document swaps
//! the masked values for the real ones in the editor text only; the executor
//! resolves masked header values back to real ones before sending.

pub mod mask;

pub use mask::{
    is_masked, mask_value, parse_secret_line, render_secret_line, Visibility, MASKED_ANNOTATION,
    MASK_RUN, REVEALED_ANNOTATION,
};

use crate::config::get_config;
use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by secret store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    /// No secrets are held for the document.
    #[error("No secrets are stored for document '{0}'")]
    NoSecrets(String),

    /// The document has no secret header lines to toggle.
    #[error("Document '{0}' contains no masked or revealed secret headers")]
    NothingToToggle(String),
}

/// In-memory store of real secret header values, keyed by document URI.
///
/// Cloning shares the underlying map. Entries live until
/// [`SecretStore::remove_document`] is called or the process exits.
#[derive(Debug, Clone)]
pub struct SecretStore {
    entries: Arc<DashMap<String, IndexMap<String, String>>>,
    visible_chars: usize,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new(get_config().mask_visible_chars)
    }
}

impl SecretStore {
    /// Creates an empty store that shows `visible_chars` characters of each
    /// masked secret.
    pub fn new(visible_chars: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            visible_chars,
        }
    }

    /// Stores the real value of a header for a document.
    pub fn put(&self, document_uri: &str, header: &str, value: impl Into<String>) {
        let mut entry = self.entries.entry(document_uri.to_string()).or_default();
        crate::models::insert_header(&mut entry, header, &value.into());
    }

    /// Returns the real value of a header, matching the name case-insensitively.
    pub fn get(&self, document_uri: &str, header: &str) -> Option<String> {
        self.entries.get(document_uri).and_then(|entry| {
            entry
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(header))
                .map(|(_, value)| value.clone())
        })
    }

    /// Returns every secret header stored for a document.
    pub fn headers_for(&self, document_uri: &str) -> IndexMap<String, String> {
        self.entries
            .get(document_uri)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether any secret is stored for a document.
    pub fn contains_document(&self, document_uri: &str) -> bool {
        self.entries
            .get(document_uri)
            .map(|entry| !entry.is_empty())
            .unwrap_or(false)
    }

    /// Forgets every secret of a document, e.g. when it is closed.
    pub fn remove_document(&self, document_uri: &str) -> bool {
        let removed = self.entries.remove(document_uri).is_some();
        if removed {
            log::debug!("Released secrets for {}", document_uri);
        }
        removed
    }

    /// Number of documents holding secrets.
    pub fn document_count(&self) -> usize {
        self.entries.len()
    }

    /// Masks a value using this store's visible prefix length.
    pub fn mask(&self, value: &str) -> String {
        mask_value(value, self.visible_chars)
    }

    /// Replaces masked header values with the real values stored for the
    /// document.
    ///
    /// Headers that are not masked, or for which nothing is stored, are left
    /// untouched. Returns the number of headers replaced.
    pub fn unmask_headers(&self, document_uri: &str, headers: &mut IndexMap<String, String>) -> usize {
        let Some(entry) = self.entries.get(document_uri) else {
            return 0;
        };

        let mut replaced = 0;
        for (name, value) in headers.iter_mut() {
            if !is_masked(value) {
                continue;
            }
            match entry.iter().find(|(secret_name, _)| secret_name.eq_ignore_ascii_case(name)) {
                Some((_, real)) => {
                    *value = real.clone();
                    replaced += 1;
                }
                None => log::warn!("No stored secret for masked header '{}' in {}", name, document_uri),
            }
        }
        replaced
    }

    /// Renders the masked header line for a stored secret.
    pub fn masked_line(&self, document_uri: &str, header: &str) -> Option<String> {
        self.get(document_uri, header)
            .map(|real| render_secret_line(header, &self.mask(&real), Visibility::Masked))
    }

    /// Current visibility of the secrets in a document's text, if it has any
    /// secret header lines.
    pub fn visibility(text: &str) -> Option<Visibility> {
        let mut found = None;
        for line in text.lines() {
            match parse_secret_line(line) {
                Some((_, Visibility::Revealed)) => return Some(Visibility::Revealed),
                Some((_, Visibility::Masked)) => found = Some(Visibility::Masked),
                None => {}
            }
        }
        found
    }

    /// Flips the visibility of every secret header line in a document.
    ///
    /// A document showing any revealed secret is masked again; otherwise the
    /// masked lines are revealed. The result is meant for the editor buffer
    /// only and must not be saved in revealed form; see
    /// [`SecretStore::mask_document`].
    pub fn toggle_visibility(
        &self,
        document_uri: &str,
        text: &str,
    ) -> Result<(String, Visibility), SecretError> {
        if !self.contains_document(document_uri) {
            return Err(SecretError::NoSecrets(document_uri.to_string()));
        }

        let target = match Self::visibility(text) {
            Some(Visibility::Masked) => Visibility::Revealed,
            Some(Visibility::Revealed) => Visibility::Masked,
            None => return Err(SecretError::NothingToToggle(document_uri.to_string())),
        };

        Ok((self.render(document_uri, text, target), target))
    }

    /// Returns the document text with every secret line in masked form.
    ///
    /// This is the only form that may be written to disk.
    pub fn mask_document(&self, document_uri: &str, text: &str) -> String {
        self.render(document_uri, text, Visibility::Masked)
    }

    fn render(&self, document_uri: &str, text: &str, target: Visibility) -> String {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| {
                let Some((name, current)) = parse_secret_line(line) else {
                    return line.to_string();
                };
                if current == target {
                    return line.to_string();
                }
                let Some(real) = self.get(document_uri, name) else {
                    log::warn!("No stored secret for header '{}' in {}", name, document_uri);
                    return line.to_string();
                };

                let indent_len = line.len() - line.trim_start().len();
                let value = match target {
                    Visibility::Masked => self.mask(&real),
                    Visibility::Revealed => real,
                };
                format!("{}{}", &line[..indent_len], render_secret_line(name, &value, target))
            })
            .collect();

        lines.join("\n")
    }
}
