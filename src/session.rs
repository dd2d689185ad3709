//! Session: one logical execution context against the remote service.
//!
//! A session turns each logical SQL operation into one pipeline exchange and
//! decodes the response back into typed data. Transaction affinity lives
//! here: the stream token (`baton`) returned by the service — and the sticky
//! replica URL, when the service pins one — are captured from every response
//! and attached to every subsequent request in scope, so a BEGIN issued in
//! one exchange and a COMMIT issued several exchanges later land on the same
//! server-side execution context.
//!
//! A session is owned by exactly one connection, prepared statement, or
//! transaction; it is never shared across units of work.

use crate::cursor::Rows;
use crate::error::{DatabaseError, Result};
use crate::proto::{
    Batch, BatchCond, BatchStep, PipelineReq, PipelineResp, Stmt, StmtResult, StreamRequest,
    StreamResponse, StreamResult,
};
use crate::rows::ResultSet;
use crate::transaction::TransactionMode;
use crate::transport::Transport;
use crate::value::Value;
use log::{debug, warn};
use std::sync::{Arc, Mutex};

/// Stream affinity state: both fields round-trip opaque server handles.
#[derive(Debug, Default)]
struct StreamState {
    baton: Option<String>,
    base_url: Option<String>,
}

/// One bound execution context against the remote SQL service.
pub struct Session {
    transport: Arc<dyn Transport>,
    stream: Mutex<StreamState>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, stream: Mutex::new(StreamState::default()) }
    }

    /// True while a server-side stream (an open transaction) is bound.
    pub fn holds_stream(&self) -> bool {
        self.stream.lock().unwrap().baton.is_some()
    }

    /// Execute one statement with positional arguments.
    ///
    /// Outside a transaction the pipeline carries a trailing `close`, so an
    /// ad-hoc call never leaves a stream open on the server.
    pub async fn execute(&self, sql: &str, args: Vec<Value>) -> Result<ResultSet> {
        debug!("[SESSION] execute: \"{}\"", sql_preview(sql));
        let close_inline = !self.holds_stream();

        let mut requests = vec![StreamRequest::Execute {
            stmt: Stmt::new(sql, encode_args(args), true),
        }];
        if close_inline {
            requests.push(StreamRequest::Close);
        }

        let resp = self.pipeline(requests).await?;
        let result = expect_execute(take_result(resp, 0)?)?;
        ResultSet::decode(result)
    }

    /// Execute multiple statements as one exchange.
    ///
    /// Steps are chained on the previous step's success, so execution stops
    /// at the first failure and the whole batch fails. With a mode the steps
    /// run inside an implicit `BEGIN <mode>` / `COMMIT`, guarded by a
    /// conditional `ROLLBACK` in case the commit step never runs.
    pub async fn batch(
        &self,
        statements: &[&str],
        mode: Option<TransactionMode>,
    ) -> Result<ResultSet> {
        debug!("[SESSION] batch: {} statements (mode={:?})", statements.len(), mode);
        let close_inline = !self.holds_stream();

        let mut steps = Vec::with_capacity(statements.len() + 3);
        if let Some(mode) = mode {
            steps.push(BatchStep {
                condition: None,
                stmt: Stmt::new(mode.begin_stmt(), Vec::new(), false),
            });
        }
        for sql in statements {
            let condition = steps.len().checked_sub(1).map(|prev| BatchCond::Ok { step: prev });
            steps.push(BatchStep { condition, stmt: Stmt::new(*sql, Vec::new(), false) });
        }
        let first_stmt = if mode.is_some() { 1 } else { 0 };
        let stmt_slots = first_stmt..first_stmt + statements.len();
        if mode.is_some() {
            let last_stmt = steps.len() - 1;
            let commit_step = steps.len();
            steps.push(BatchStep {
                condition: Some(BatchCond::Ok { step: last_stmt }),
                stmt: Stmt::new("COMMIT", Vec::new(), false),
            });
            steps.push(BatchStep {
                condition: Some(BatchCond::Not {
                    cond: Box::new(BatchCond::Ok { step: commit_step }),
                }),
                stmt: Stmt::new("ROLLBACK", Vec::new(), false),
            });
        }

        let mut requests = vec![StreamRequest::Batch { batch: Batch { steps } }];
        if close_inline {
            requests.push(StreamRequest::Close);
        }

        let resp = self.pipeline(requests).await?;
        let result = match take_result(resp, 0)? {
            StreamResult::Ok { response: StreamResponse::Batch { result } } => result,
            StreamResult::Error { error } => return Err(DatabaseError::from_wire(error)),
            other => {
                return Err(DatabaseError::Transport(format!(
                    "malformed response: expected batch result, got {other:?}"
                )))
            }
        };

        // The first step error in batch order fails the whole batch; the
        // ok-chain guarantees nothing after it was executed.
        if let Some(error) = result.step_errors.iter().flatten().next() {
            return Err(DatabaseError::from_wire(error.clone()));
        }

        let mut rows_affected = 0u64;
        let mut last_insert_rowid = None;
        for slot in stmt_slots {
            if let Some(Some(step)) = result.step_results.get(slot) {
                rows_affected += step.affected_row_count;
                if let Some(rowid) = crate::rows::decode_rowid(step.last_insert_rowid.as_deref())? {
                    last_insert_rowid = Some(rowid);
                }
            }
        }
        Ok(ResultSet::write_summary(rows_affected, last_insert_rowid))
    }

    /// Open a transaction on this session, binding its stream token.
    pub(crate) async fn begin(&self, mode: TransactionMode) -> Result<()> {
        debug!("[SESSION] begin: {}", mode.begin_stmt());
        self.control(mode.begin_stmt(), false).await?;
        if !self.holds_stream() {
            // Without the token no later call can reach this transaction.
            return Err(DatabaseError::Transport(
                "server did not issue a stream token for the transaction".to_string(),
            ));
        }
        Ok(())
    }

    /// Commit the bound transaction and release its stream.
    pub(crate) async fn commit(&self) -> Result<()> {
        debug!("[SESSION] commit");
        self.control("COMMIT", true).await
    }

    /// Roll back the bound transaction and release its stream.
    pub(crate) async fn rollback(&self) -> Result<()> {
        debug!("[SESSION] rollback");
        self.control("ROLLBACK", true).await
    }

    /// Start a cursor over the statement's result on a dedicated stream.
    ///
    /// The cursor owns the stream token; abandoning the cursor releases the
    /// stream (see [`Rows`]). The session's own transaction state is not
    /// involved.
    pub async fn iterate(&self, sql: &str, args: Vec<Value>) -> Result<Rows> {
        debug!("[SESSION] iterate: \"{}\"", sql_preview(sql));
        let req = PipelineReq {
            baton: None,
            requests: vec![StreamRequest::Execute {
                stmt: Stmt::new(sql, encode_args(args), true),
            }],
        };
        let resp = self.transport.roundtrip(&req, None).await?;
        let baton = resp.baton.clone();
        let base_url = resp.base_url.clone();

        let decoded = take_result(resp, 0)
            .and_then(expect_execute)
            .and_then(ResultSet::decode);
        match decoded {
            Ok(result) => Ok(Rows::new(Arc::clone(&self.transport), baton, base_url, result)),
            Err(err) => {
                // The statement failed but the stream may have been opened;
                // release it before surfacing the failure.
                if let Some(baton) = baton {
                    let close = PipelineReq {
                        baton: Some(baton),
                        requests: vec![StreamRequest::Close],
                    };
                    if let Err(close_err) =
                        self.transport.roundtrip(&close, base_url.as_deref()).await
                    {
                        warn!("[SESSION] Failed to close cursor stream: {close_err}");
                    }
                }
                Err(err)
            }
        }
    }

    /// Hand the bound stream handles to a caller that will release them.
    pub(crate) fn detach_stream(&self) -> (Option<String>, Option<String>) {
        let mut state = self.stream.lock().unwrap();
        (state.baton.take(), state.base_url.take())
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Issue a control statement (`BEGIN ...`, `COMMIT`, `ROLLBACK`).
    async fn control(&self, sql: &str, close_after: bool) -> Result<()> {
        let mut requests = vec![StreamRequest::Execute {
            stmt: Stmt::new(sql, Vec::new(), false),
        }];
        if close_after {
            requests.push(StreamRequest::Close);
        }
        let resp = self.pipeline(requests).await?;
        expect_execute(take_result(resp, 0)?)?;
        Ok(())
    }

    /// One exchange on this session's stream: attach the current handles,
    /// then capture whatever handles the response carries.
    async fn pipeline(&self, requests: Vec<StreamRequest>) -> Result<PipelineResp> {
        let (baton, base_url) = {
            let state = self.stream.lock().unwrap();
            (state.baton.clone(), state.base_url.clone())
        };

        let req = PipelineReq { baton, requests };
        let resp = self.transport.roundtrip(&req, base_url.as_deref()).await?;

        let mut state = self.stream.lock().unwrap();
        state.baton = resp.baton.clone();
        if let Some(url) = &resp.base_url {
            state.base_url = Some(url.clone());
        }
        if state.baton.is_none() {
            state.base_url = None;
        }
        drop(state);
        Ok(resp)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("holds_stream", &self.holds_stream()).finish()
    }
}

fn encode_args(args: Vec<Value>) -> Vec<crate::proto::WireValue> {
    args.iter().map(Value::encode).collect()
}

/// Truncate long SQL for log lines.
fn sql_preview(sql: &str) -> String {
    let flat = sql.replace('\n', " ");
    if flat.len() > 80 {
        let mut end = 80;
        while !flat.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &flat[..end])
    } else {
        flat
    }
}

pub(crate) fn take_result(resp: PipelineResp, idx: usize) -> Result<StreamResult> {
    resp.results.into_iter().nth(idx).ok_or_else(|| {
        DatabaseError::Transport("malformed response: missing pipeline result".to_string())
    })
}

pub(crate) fn expect_execute(result: StreamResult) -> Result<StmtResult> {
    match result {
        StreamResult::Ok { response: StreamResponse::Execute { result } } => Ok(result),
        StreamResult::Error { error } => Err(DatabaseError::from_wire(error)),
        other => Err(DatabaseError::Transport(format!(
            "malformed response: expected execute result, got {other:?}"
        ))),
    }
}
