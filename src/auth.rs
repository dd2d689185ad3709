//! Authentication for the remote SQL service.
//!
//! Attaches the `Authorization` header to outgoing HTTP requests. The service
//! authenticates with a bearer token; local development servers typically run
//! without authentication.

/// Authentication credentials for the remote service.
///
/// # Examples
///
/// ```rust
/// use hrana_link::AuthProvider;
///
/// // Bearer token authentication
/// let auth = AuthProvider::token("eyJhbGc...".to_string());
///
/// // No authentication (local development server)
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone)]
pub enum AuthProvider {
    /// Bearer token authentication
    Token(String),

    /// No authentication (local / trusted network)
    None,
}

impl AuthProvider {
    /// Create bearer token authentication
    pub fn token(token: String) -> Self {
        Self::Token(token)
    }

    /// No authentication
    pub fn none() -> Self {
        Self::None
    }

    /// Attach the `Authorization: Bearer <token>` header when configured.
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Token(token) => request.bearer_auth(token),
            Self::None => request,
        }
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
