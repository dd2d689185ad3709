//! Connection facade.
//!
//! Composes one default session for ad-hoc calls plus factories for prepared
//! statements and transactions, each of which gets a session of its own.

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::error::{DatabaseError, Result};
use crate::rows::ResultSet;
use crate::session::Session;
use crate::statement::Statement;
use crate::transaction::{Transaction, TransactionMode};
use crate::transport::{HttpTransport, Transport};
use crate::value::Value;
use std::sync::Arc;
use std::time::Duration;

/// Connect to a remote database service.
///
/// # Examples
///
/// ```rust,no_run
/// use hrana_link::Config;
///
/// # async fn example() -> hrana_link::Result<()> {
/// let conn = hrana_link::connect(&Config::new("http://localhost:8080"))?;
/// let result = conn.execute("SELECT 1", vec![]).await?;
/// # Ok(())
/// # }
/// ```
pub fn connect(config: &Config) -> Result<Connection> {
    let mut builder = Connection::builder().url(&config.url);
    if let Some(token) = &config.auth_token {
        builder = builder.auth_token(token);
    }
    builder.build()
}

/// Client facade for one remote database.
///
/// Ad-hoc `execute`/`batch` calls run on the connection's default session;
/// those exchanges carry no cross-call state (each pipeline closes its own
/// stream), so sequential ad-hoc calls never interfere. [`Connection::prepare`]
/// and [`Connection::transaction`] each construct a dedicated session, so
/// concurrent units of work never share a remote execution context.
pub struct Connection {
    transport: Arc<dyn Transport>,
    session: Session,
}

impl Connection {
    /// Create a new builder for configuring the connection
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Execute one SQL statement with positional arguments.
    pub async fn execute(&self, sql: &str, args: Vec<Value>) -> Result<ResultSet> {
        self.session.execute(sql, args).await
    }

    /// Execute multiple statements in one exchange; see [`Session::batch`].
    ///
    /// With a mode, the statements run inside an implicit transaction of that
    /// mode.
    pub async fn batch(
        &self,
        statements: &[&str],
        mode: Option<TransactionMode>,
    ) -> Result<ResultSet> {
        self.session.batch(statements, mode).await
    }

    /// Prepare a reusable statement with a private session.
    pub fn prepare(&self, sql: impl Into<String>) -> Statement {
        Statement::new(Arc::clone(&self.transport), sql.into())
    }

    /// Open an explicit transaction on a dedicated session.
    pub async fn transaction(&self, mode: TransactionMode) -> Result<Transaction> {
        Transaction::create(Arc::clone(&self.transport), mode).await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Builder for configuring [`Connection`] instances.
pub struct ConnectionBuilder {
    url: Option<String>,
    auth: AuthProvider,
    timeout: Duration,
    connect_timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
}

impl ConnectionBuilder {
    fn new() -> Self {
        Self {
            url: None,
            auth: AuthProvider::none(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            transport: None,
        }
    }

    /// Set the base URL of the remote service
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set bearer token authentication
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthProvider::token(token.into());
        self
    }

    /// Set authentication provider directly
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    /// Set the per-request timeout (default 30s)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout (default 10s)
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Substitute a custom transport, bypassing the HTTP settings. Used for
    /// testing and for embedding alternative wire carriers.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the connection
    pub fn build(self) -> Result<Connection> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let url = self
                    .url
                    .ok_or_else(|| DatabaseError::Configuration("url is required".into()))?;

                // Keep-alive pooling: sequential ad-hoc calls reuse one TCP
                // connection instead of re-handshaking per exchange.
                let http_client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .connect_timeout(self.connect_timeout)
                    .pool_max_idle_per_host(10)
                    .pool_idle_timeout(Duration::from_secs(90))
                    .build()
                    .map_err(|e| DatabaseError::Configuration(e.to_string()))?;

                Arc::new(HttpTransport::new(url, http_client, self.auth))
            }
        };

        let session = Session::new(Arc::clone(&transport));
        Ok(Connection { transport, session })
    }
}
