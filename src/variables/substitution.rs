//! `{{variable}}` placeholder substitution.
//!
//! Substitution is partial: placeholders whose name is not in the mapping are
//! left in the text exactly as written, so a later step (or the user) can see
//! what is still missing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Matches `{{name}}` with optional whitespace around the name.
static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([^{}\s][^{}]*?)\s*\}\}").expect("Failed to compile variable regex")
});

/// Replaces every `{{name}}` whose name exists in `variables`.
///
/// String values are inserted as-is; any other value is inserted as its JSON
/// text (`42`, `true`, `{"a":1}`).
///
/// # Examples
///
/// ```
/// use api_notebook::variables::substitute_variables;
/// use serde_json::json;
///
/// let vars = json!({"baseUrl": "https://api.example.com"});
/// let text = substitute_variables("GET {{baseUrl}}/users/{{id}}", vars.as_object().unwrap());
/// assert_eq!(text, "GET https://api.example.com/users/{{id}}");
/// ```
pub fn substitute_variables(text: &str, variables: &Map<String, Value>) -> String {
    // Fast path: nothing to replace
    if !text.contains("{{") || variables.is_empty() {
        return text.to_string();
    }

    VARIABLE_REGEX
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            match variables.get(name) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Lists the placeholder names in `text` that `variables` does not define.
pub fn unresolved_variables(text: &str, variables: &Map<String, Value>) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for caps in VARIABLE_REGEX.captures_iter(text) {
        let name = caps[1].to_string();
        if !variables.contains_key(&name) && !missing.contains(&name) {
            missing.push(name);
        }
    }
    missing
}
