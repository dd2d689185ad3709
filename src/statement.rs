//! Prepared statements: fixed SQL text bound to a private session.

use crate::cursor::Rows;
use crate::error::Result;
use crate::rows::{ResultSet, Row};
use crate::session::Session;
use crate::transport::Transport;
use crate::value::Value;
use std::sync::Arc;

/// A reusable SQL statement.
///
/// Each statement owns a private [`Session`], so repeated execution from
/// concurrent callers never interleaves with unrelated work on the
/// connection. Two statements prepared from the same text are fully
/// independent.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example(conn: hrana_link::Connection) -> hrana_link::Result<()> {
/// let stmt = conn.prepare("SELECT name FROM users WHERE id = ?");
/// let row = stmt.get(vec![42.into()]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Statement {
    session: Session,
    sql: String,
}

/// Write counters returned by [`Statement::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub rows_affected: u64,
    pub last_insert_rowid: Option<i64>,
}

impl Statement {
    pub(crate) fn new(transport: Arc<dyn Transport>, sql: String) -> Self {
        Self { session: Session::new(transport), sql }
    }

    /// The statement's SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Execute and return the full result set.
    pub async fn execute(&self, args: Vec<Value>) -> Result<ResultSet> {
        self.session.execute(&self.sql, args).await
    }

    /// Execute and return the first row; `None` when the result is empty.
    pub async fn get(&self, args: Vec<Value>) -> Result<Option<Row>> {
        Ok(self.execute(args).await?.rows.into_iter().next())
    }

    /// Execute and materialize every row.
    pub async fn all(&self, args: Vec<Value>) -> Result<Vec<Row>> {
        Ok(self.execute(args).await?.rows)
    }

    /// Execute a write statement, returning its counters.
    pub async fn run(&self, args: Vec<Value>) -> Result<RunResult> {
        let result = self.execute(args).await?;
        Ok(RunResult {
            rows_affected: result.rows_affected,
            last_insert_rowid: result.last_insert_rowid,
        })
    }

    /// Execute and consume the rows through a cursor.
    pub async fn iterate(&self, args: Vec<Value>) -> Result<Rows> {
        self.session.iterate(&self.sql, args).await
    }
}
