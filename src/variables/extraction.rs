//! Response-to-variable extraction.
//!
//! After an HTTP cell runs, an object body is shallow-merged into the session
//! variables. Aliases additionally copy selected response fields to other
//! variable names, e.g. `token` to `authToken`, so later cells can refer to a
//! stable name regardless of how the API spells it.

use super::VariableContext;
use crate::config::get_config;
use indexmap::IndexMap;
use serde_json::Value;

/// Rules applied to a response body after an HTTP cell executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRules {
    /// Whether object bodies are merged key by key.
    pub merge_body: bool,

    /// Response field name to variable name.
    pub aliases: IndexMap<String, String>,
}

impl ExtractionRules {
    /// Creates rules with the given aliases and body merging enabled.
    pub fn new(aliases: IndexMap<String, String>) -> Self {
        Self {
            merge_body: true,
            aliases,
        }
    }

    /// Creates rules from the global configuration.
    pub fn from_global_config() -> Self {
        Self::new(get_config().response_aliases)
    }

    /// Adds or replaces an alias.
    pub fn with_alias(mut self, field: impl Into<String>, variable: impl Into<String>) -> Self {
        self.aliases.insert(field.into(), variable.into());
        self
    }

    /// Applies the rules to a response body.
    ///
    /// Non-object bodies are ignored.
    ///
    /// # Returns
    ///
    /// The variable names that were written.
    pub fn apply(&self, body: &Value, context: &mut VariableContext) -> Vec<String> {
        let Some(object) = body.as_object() else {
            return Vec::new();
        };

        let mut written = if self.merge_body {
            context.merge_object(object)
        } else {
            Vec::new()
        };

        for (field, variable) in &self.aliases {
            if let Some(value) = object.get(field) {
                context.set(variable.clone(), value.clone());
                if !written.contains(variable) {
                    written.push(variable.clone());
                }
            }
        }

        written
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::from_global_config()
    }
}
