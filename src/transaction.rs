//! Explicit transactions with enforced lifecycle ordering.

use crate::error::{DatabaseError, Result};
use crate::proto::{PipelineReq, StreamRequest};
use crate::rows::ResultSet;
use crate::session::Session;
use crate::transport::Transport;
use crate::value::Value;
use log::debug;
use std::str::FromStr;
use std::sync::Arc;

/// Requested locking behavior of the transaction's begin statement.
///
/// The mode only changes which begin statement is issued; client-side
/// behavior is otherwise identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// `BEGIN IMMEDIATE`: take the write lock up front.
    Write,
    /// `BEGIN TRANSACTION READONLY`: read-only snapshot.
    Read,
    /// `BEGIN DEFERRED`: default lazy locking.
    #[default]
    Deferred,
}

impl TransactionMode {
    pub(crate) fn begin_stmt(&self) -> &'static str {
        match self {
            Self::Write => "BEGIN IMMEDIATE",
            Self::Read => "BEGIN TRANSACTION READONLY",
            Self::Deferred => "BEGIN DEFERRED",
        }
    }
}

impl FromStr for TransactionMode {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "write" => Ok(Self::Write),
            "read" => Ok(Self::Read),
            "deferred" => Ok(Self::Deferred),
            other => Err(DatabaseError::Configuration(format!(
                "unknown transaction mode {other:?} (expected \"write\", \"read\" or \"deferred\")"
            ))),
        }
    }
}

/// An open transaction bound to a dedicated session.
///
/// State machine: open until exactly one of `commit`, `rollback`, or `close`
/// runs. `commit`/`rollback` record their outcome; `close` without a prior
/// commit aborts the transaction (implicit `ROLLBACK`) without recording
/// either outcome, and is idempotent. Every other operation on a closed
/// transaction fails with a transaction-state error and performs no network
/// exchange.
///
/// Operations take `&mut self`: the remote execution context is one serial
/// resource, so concurrent calls on the same transaction are ruled out at
/// compile time.
#[derive(Debug)]
pub struct Transaction {
    session: Session,
    mode: TransactionMode,
    closed: bool,
    committed: bool,
    rolled_back: bool,
}

impl Transaction {
    /// Open a transaction: construct a dedicated session and issue the
    /// mode-appropriate begin statement.
    pub(crate) async fn create(transport: Arc<dyn Transport>, mode: TransactionMode) -> Result<Self> {
        let session = Session::new(transport);
        session.begin(mode).await?;
        debug!("[TXN] Opened ({:?})", mode);
        Ok(Self { session, mode, closed: false, committed: false, rolled_back: false })
    }

    /// Execute one statement inside this transaction.
    pub async fn execute(&mut self, sql: &str, args: Vec<Value>) -> Result<ResultSet> {
        self.ensure_open("execute")?;
        self.session.execute(sql, args).await
    }

    /// Execute a batch of statements inside this transaction.
    pub async fn batch(&mut self, statements: &[&str]) -> Result<ResultSet> {
        self.ensure_open("batch")?;
        self.session.batch(statements, None).await
    }

    /// Commit and close.
    pub async fn commit(&mut self) -> Result<()> {
        self.ensure_open("commit")?;
        self.session.commit().await?;
        self.closed = true;
        self.committed = true;
        debug!("[TXN] Committed");
        Ok(())
    }

    /// Roll back and close.
    pub async fn rollback(&mut self) -> Result<()> {
        self.ensure_open("rollback")?;
        self.session.rollback().await?;
        self.closed = true;
        self.rolled_back = true;
        debug!("[TXN] Rolled back");
        Ok(())
    }

    /// Close without committing: uncommitted work is discarded via an
    /// implicit `ROLLBACK`, but neither outcome flag is recorded. Calling
    /// `close` again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.session.rollback().await?;
        self.closed = true;
        debug!("[TXN] Closed without commit");
        Ok(())
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    fn ensure_open(&self, op: &str) -> Result<()> {
        if self.closed {
            return Err(DatabaseError::TransactionState(format!(
                "cannot {op}: transaction is closed"
            )));
        }
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Closing the stream aborts the open transaction server-side.
        let (baton, base_url) = self.session.detach_stream();
        let Some(baton) = baton else { return };
        let transport = Arc::clone(self.session.transport());

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let req = PipelineReq { baton: Some(baton), requests: vec![StreamRequest::Close] };
                if let Err(err) = transport.roundtrip(&req, base_url.as_deref()).await {
                    debug!("[TXN] Abort after drop failed: {err}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_maps_to_begin_statement() {
        assert_eq!(TransactionMode::Write.begin_stmt(), "BEGIN IMMEDIATE");
        assert_eq!(TransactionMode::Read.begin_stmt(), "BEGIN TRANSACTION READONLY");
        assert_eq!(TransactionMode::Deferred.begin_stmt(), "BEGIN DEFERRED");
    }

    #[test]
    fn mode_parses_from_contract_strings() {
        assert_eq!("write".parse::<TransactionMode>().unwrap(), TransactionMode::Write);
        assert_eq!("read".parse::<TransactionMode>().unwrap(), TransactionMode::Read);
        assert_eq!("deferred".parse::<TransactionMode>().unwrap(), TransactionMode::Deferred);
        assert!("serializable".parse::<TransactionMode>().is_err());
    }

    #[test]
    fn default_mode_is_deferred() {
        assert_eq!(TransactionMode::default(), TransactionMode::Deferred);
    }
}
