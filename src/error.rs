//! Error taxonomy for hrana-link.
//!
//! Every failure a caller can observe is a [`DatabaseError`] in exactly one
//! of three classifications: the exchange with the service failed at the
//! envelope level (`Transport`), the service executed the request and
//! reported the statement itself failed (`Sql`), or the caller misused a
//! closed transaction (`TransactionState`). Server-reported message text is
//! preserved verbatim so callers can match on phrases like "no such table".

use crate::proto::WireError;
use thiserror::Error;

/// Errors surfaced by hrana-link operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The exchange did not complete at the network / protocol-envelope
    /// level: connectivity failure, non-success HTTP status, or a response
    /// the client could not decode.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service accepted the exchange but reports the statement failed
    /// (missing table or column, constraint violation, syntax error).
    #[error("sql error: {message}")]
    Sql {
        /// Server-reported message, preserved verbatim.
        message: String,
        /// Optional server error code (e.g. `SQLITE_CONSTRAINT`).
        code: Option<String>,
    },

    /// Client-side misuse: an operation was issued on a transaction after it
    /// closed. No network exchange takes place.
    #[error("transaction state error: {0}")]
    TransactionState(String),

    /// Invalid client configuration (builder misuse, unparseable URL).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Normalize a server-reported statement error.
    pub(crate) fn from_wire(err: WireError) -> Self {
        Self::Sql { message: err.message, code: err.code }
    }

    /// True for envelope-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// True for server-reported SQL failures.
    pub fn is_sql(&self) -> bool {
        matches!(self, Self::Sql { .. })
    }

    /// True for closed-transaction misuse.
    pub fn is_transaction_state(&self) -> bool {
        matches!(self, Self::TransactionState(_))
    }
}

impl From<reqwest::Error> for DatabaseError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(format!("malformed response: {err}"))
    }
}

/// Result type for all hrana-link operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
