//! Notebook variable context.
//!
//! A [`VariableContext`] is owned by one notebook session. JSON cells and HTTP
//! responses merge values into it; the parser reads it when substituting
//! `{{name}}` placeholders.

pub mod extraction;
pub mod substitution;

pub use extraction::ExtractionRules;
pub use substitution::substitute_variables;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised when merging variables from cell content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    /// The content is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The content is valid JSON but not an object.
    #[error("Invalid JSON: expected an object of variables, found {0}")]
    NotAnObject(&'static str),
}

/// Mutable variable mapping for one notebook session.
///
/// Merges are shallow: keys in the incoming object overwrite existing keys,
/// other keys are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableContext {
    values: Map<String, Value>,
}

impl VariableContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from an existing map.
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Gets a variable value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets a variable value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Checks if a variable exists.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Checks if the context has no variables.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every variable. Only called on explicit user request.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Shallow-merges an object into the context.
    ///
    /// # Returns
    ///
    /// The merged keys, in the order they appear in `object`.
    pub fn merge_object(&mut self, object: &Map<String, Value>) -> Vec<String> {
        object
            .iter()
            .map(|(key, value)| {
                self.values.insert(key.clone(), value.clone());
                key.clone()
            })
            .collect()
    }

    /// Parses `content` as a JSON object and merges it into the context.
    ///
    /// The context is left untouched when parsing fails.
    pub fn merge_json(&mut self, content: &str) -> Result<Vec<String>, VariableError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| VariableError::InvalidJson(e.to_string()))?;

        match value {
            Value::Object(object) => Ok(self.merge_object(&object)),
            other => Err(VariableError::NotAnObject(json_kind(&other))),
        }
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Returns a copy of the current values.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.clone()
    }

    /// Replaces `{{name}}` placeholders in `text` with values from this context.
    pub fn substitute(&self, text: &str) -> String {
        substitute_variables(text, &self.values)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
