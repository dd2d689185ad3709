//! Connection configuration.

/// Configuration for connecting to a remote database service.
///
/// Immutable once a session has been constructed from it. Credential loading
/// (environment, files, secret stores) is the embedding application's
/// concern; this type only carries the resolved values.
///
/// # Examples
///
/// ```rust
/// use hrana_link::Config;
///
/// let config = Config::new("http://localhost:8080")
///     .with_auth_token("eyJhbGc...");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote service, e.g. `http://localhost:8080`.
    pub url: String,

    /// Optional bearer token for the service.
    pub auth_token: Option<String>,
}

impl Config {
    /// Create a configuration for the given base URL without authentication.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), auth_token: None }
    }

    /// Set the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}
