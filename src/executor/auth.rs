//! Authentication header synthesis.

use crate::environment::{AuthConfig, AuthKind, Credentials};
use base64::{engine::general_purpose, Engine as _};

/// Builds the authentication header for an environment's auth settings.
///
/// Returns `None` for kinds that need no header, unknown kinds, and missing
/// secret material.
pub fn synthesize_auth_header(auth: &AuthConfig, credentials: &Credentials) -> Option<(String, String)> {
    match auth.kind {
        AuthKind::Bearer => credentials
            .api_key
            .as_deref()
            .map(|token| ("Authorization".to_string(), format!("Bearer {}", token))),
        AuthKind::ApiKey => credentials
            .api_key
            .as_deref()
            .map(|key| (auth.api_key_header().to_string(), key.to_string())),
        AuthKind::Basic => match (&credentials.username, &credentials.password) {
            (Some(username), Some(password)) => Some((
                "Authorization".to_string(),
                format!("Basic {}", encode_basic(username, password)),
            )),
            _ => None,
        },
        AuthKind::None | AuthKind::Other => None,
    }
}

/// Base64 encoding of `username:password`.
pub fn encode_basic(username: &str, password: &str) -> String {
    general_purpose::STANDARD.encode(format!("{}:{}", username, password))
}
