//! Environment data models.
//!
//! An environment is one deployment of an API (dev, staging, production): a
//! base URL, extra headers, an authentication kind and a timeout. Secret
//! material lives apart from the record in [`Credentials`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Authentication kind configured for an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    /// No authentication
    None,
    /// `Authorization: Bearer <apiKey>`
    Bearer,
    /// API key in a configurable header
    #[serde(rename = "apikey")]
    ApiKey,
    /// `Authorization: Basic <base64(username:password)>`
    Basic,
    /// Any kind this crate does not synthesize headers for
    #[serde(other)]
    Other,
}

/// Authentication settings of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Authentication kind.
    #[serde(rename = "type")]
    pub kind: AuthKind,

    /// Header name for API key authentication. Defaults to `X-API-Key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_name: Option<String>,
}

impl AuthConfig {
    /// Header used for API key authentication when none is configured.
    pub const DEFAULT_API_KEY_HEADER: &'static str = "X-API-Key";

    /// Creates an auth config of the given kind.
    pub fn new(kind: AuthKind) -> Self {
        Self {
            kind,
            api_key_name: None,
        }
    }

    /// Creates an API key config using the given header name.
    pub fn api_key(header_name: impl Into<String>) -> Self {
        Self {
            kind: AuthKind::ApiKey,
            api_key_name: Some(header_name.into()),
        }
    }

    /// Header name used for API key authentication.
    pub fn api_key_header(&self) -> &str {
        self.api_key_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(Self::DEFAULT_API_KEY_HEADER)
    }
}

/// An environment record as returned by the configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Stable identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Schema this environment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    /// Base URL requests are sent to.
    pub base_url: String,

    /// Headers added to every request for this environment.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Authentication settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Environment {
    /// Creates an environment with no headers, auth or timeout.
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schema_id: None,
            base_url: base_url.into(),
            headers: IndexMap::new(),
            auth: None,
            timeout: None,
            description: None,
        }
    }

    /// Sets the owning schema.
    pub fn with_schema(mut self, schema_id: impl Into<String>) -> Self {
        self.schema_id = Some(schema_id.into());
        self
    }

    /// Sets the authentication config.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Adds a custom header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Base URL without trailing slashes.
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Secret material for an environment.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Username for basic authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for basic authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Token or key for bearer and API key authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Credentials {
    /// Credentials holding only an API key or token.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Credentials for basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            api_key: None,
        }
    }
}

// Secret values never reach logs through Debug.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fully resolved configuration for one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEnvironment {
    /// The environment record.
    pub environment: Environment,

    /// Headers to apply before request headers.
    #[serde(default)]
    pub resolved_headers: IndexMap<String, String>,

    /// Authentication settings, if any.
    #[serde(default)]
    pub resolved_auth: Option<AuthConfig>,

    /// Timeout in milliseconds, if configured.
    #[serde(default)]
    pub resolved_timeout: Option<u64>,
}

impl ResolvedEnvironment {
    /// Resolves an environment record without any inherited settings.
    pub fn from_environment(environment: Environment) -> Self {
        Self {
            resolved_headers: environment.headers.clone(),
            resolved_auth: environment.auth.clone(),
            resolved_timeout: environment.timeout,
            environment,
        }
    }
}
