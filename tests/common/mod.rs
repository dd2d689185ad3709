#![allow(dead_code)]
//! In-memory fake of the remote service for integration tests.
//!
//! Implements the [`Transport`] trait with a tiny server model: one `users`
//! table, stream tokens that rotate on every exchange (so the client is
//! forced to round-trip the latest token), per-stream transaction state, and
//! batch condition evaluation. SQL understanding is limited to the statement
//! shapes the tests issue.

use async_trait::async_trait;
use hrana_link::proto::{
    Batch, BatchCond, BatchResult, Col, PipelineReq, PipelineResp, Stmt, StmtResult,
    StreamRequest, StreamResponse, StreamResult, WireError, WireValue,
};
use hrana_link::{Connection, DatabaseError, Result, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
}

#[derive(Default)]
struct TableState {
    committed: Vec<UserRow>,
    next_rowid: i64,
}

/// Server-side stream: pending (uncommitted) writes while a transaction is
/// open on it.
#[derive(Default)]
struct StreamSrv {
    txn: Option<Vec<UserRow>>,
    read_only: bool,
}

pub struct FakeServer {
    table: Mutex<TableState>,
    streams: Mutex<HashMap<String, StreamSrv>>,
    baton_counter: AtomicU64,
    exchanges: AtomicU64,
    requests: Mutex<Vec<String>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(TableState { committed: Vec::new(), next_rowid: 1 }),
            streams: Mutex::new(HashMap::new()),
            baton_counter: AtomicU64::new(0),
            exchanges: AtomicU64::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn connect(self: &Arc<Self>) -> Connection {
        Connection::builder()
            .transport(Arc::clone(self) as Arc<dyn Transport>)
            .build()
            .expect("fake connection should build")
    }

    /// Total pipeline exchanges seen.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// Streams currently open (i.e. server-side resources held).
    pub fn open_streams(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    /// Committed rows of the `users` table.
    pub fn committed_rows(&self) -> Vec<UserRow> {
        self.table.lock().unwrap().committed.clone()
    }

    /// Flattened request log, e.g. `execute:BEGIN IMMEDIATE`, `batch:4`,
    /// `close`.
    pub fn request_log(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn log_contains(&self, entry: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|r| r == entry)
    }

    fn next_baton(&self) -> String {
        format!("baton-{}", self.baton_counter.fetch_add(1, Ordering::SeqCst))
    }

    fn run_stmt(&self, stream: &mut StreamSrv, stmt: &Stmt) -> std::result::Result<StmtResult, WireError> {
        let sql = stmt.sql.trim();

        if sql.starts_with("CREATE TABLE") {
            return Ok(StmtResult::default());
        }
        if sql.starts_with("BEGIN") {
            stream.txn = Some(Vec::new());
            stream.read_only = sql.contains("READONLY");
            return Ok(StmtResult::default());
        }
        if sql == "COMMIT" {
            if let Some(pending) = stream.txn.take() {
                self.table.lock().unwrap().committed.extend(pending);
            }
            return Ok(StmtResult::default());
        }
        if sql == "ROLLBACK" {
            stream.txn = None;
            return Ok(StmtResult::default());
        }
        if sql.starts_with("INSERT INTO users") {
            if stream.read_only {
                return Err(WireError {
                    message: "attempt to write a readonly database".to_string(),
                    code: Some("SQLITE_READONLY".to_string()),
                });
            }
            let name = match stmt.args.first() {
                Some(WireValue::Text { value }) => value.clone(),
                _ => literal_between_quotes(sql).unwrap_or_default(),
            };
            let id = {
                let mut table = self.table.lock().unwrap();
                let id = table.next_rowid;
                table.next_rowid += 1;
                id
            };
            let row = UserRow { id, name };
            match &mut stream.txn {
                Some(pending) => pending.push(row),
                None => self.table.lock().unwrap().committed.push(row),
            }
            return Ok(StmtResult {
                affected_row_count: 1,
                last_insert_rowid: Some(id.to_string()),
                ..StmtResult::default()
            });
        }
        if sql.starts_with("SELECT") && sql.contains("FROM users") {
            let mut rows: Vec<UserRow> = self.table.lock().unwrap().committed.clone();
            if let Some(pending) = &stream.txn {
                rows.extend(pending.iter().cloned());
            }
            return Ok(StmtResult {
                cols: vec![
                    Col { name: "id".to_string(), decltype: Some("INTEGER".to_string()) },
                    Col { name: "name".to_string(), decltype: Some("TEXT".to_string()) },
                ],
                rows: rows
                    .into_iter()
                    .map(|r| {
                        vec![
                            WireValue::Integer { value: r.id.to_string() },
                            WireValue::Text { value: r.name },
                        ]
                    })
                    .collect(),
                ..StmtResult::default()
            });
        }
        if let Some(table) = sql.strip_prefix("SELECT * FROM ") {
            return Err(WireError {
                message: format!("no such table: {table}"),
                code: Some("SQLITE_ERROR".to_string()),
            });
        }

        Err(WireError {
            message: format!("fake server does not understand: {sql}"),
            code: None,
        })
    }

    fn run_batch(&self, stream: &mut StreamSrv, batch: &Batch) -> BatchResult {
        let mut ok = Vec::with_capacity(batch.steps.len());
        let mut result = BatchResult::default();

        for step in &batch.steps {
            let enabled = step.condition.as_ref().map_or(true, |c| eval_cond(c, &ok));
            if !enabled {
                ok.push(false);
                result.step_results.push(None);
                result.step_errors.push(None);
                continue;
            }
            match self.run_stmt(stream, &step.stmt) {
                Ok(step_result) => {
                    ok.push(true);
                    result.step_results.push(Some(step_result));
                    result.step_errors.push(None);
                }
                Err(err) => {
                    ok.push(false);
                    result.step_results.push(None);
                    result.step_errors.push(Some(err));
                }
            }
        }
        result
    }
}

fn eval_cond(cond: &BatchCond, ok: &[bool]) -> bool {
    match cond {
        BatchCond::Ok { step } => ok.get(*step).copied().unwrap_or(false),
        BatchCond::Not { cond } => !eval_cond(cond, ok),
    }
}

fn literal_between_quotes(sql: &str) -> Option<String> {
    let start = sql.find('\'')? + 1;
    let end = sql[start..].find('\'')? + start;
    Some(sql[start..end].to_string())
}

#[async_trait]
impl Transport for FakeServer {
    async fn roundtrip(
        &self,
        req: &PipelineReq,
        _base_url_override: Option<&str>,
    ) -> Result<PipelineResp> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        let mut stream = match &req.baton {
            Some(baton) => self
                .streams
                .lock()
                .unwrap()
                .remove(baton)
                .ok_or_else(|| DatabaseError::Transport(format!("unknown baton: {baton}")))?,
            None => StreamSrv::default(),
        };

        let mut closed = false;
        let mut results = Vec::with_capacity(req.requests.len());
        for request in &req.requests {
            match request {
                StreamRequest::Execute { stmt } => {
                    self.requests.lock().unwrap().push(format!("execute:{}", stmt.sql));
                    results.push(match self.run_stmt(&mut stream, stmt) {
                        Ok(result) => StreamResult::Ok {
                            response: StreamResponse::Execute { result },
                        },
                        Err(error) => StreamResult::Error { error },
                    });
                }
                StreamRequest::Batch { batch } => {
                    self.requests.lock().unwrap().push(format!("batch:{}", batch.steps.len()));
                    let result = self.run_batch(&mut stream, batch);
                    results.push(StreamResult::Ok { response: StreamResponse::Batch { result } });
                }
                StreamRequest::Close => {
                    self.requests.lock().unwrap().push("close".to_string());
                    closed = true;
                    results.push(StreamResult::Ok { response: StreamResponse::Close });
                }
            }
        }

        let baton = if closed {
            // Closing discards any uncommitted work on the stream.
            None
        } else {
            let baton = self.next_baton();
            self.streams.lock().unwrap().insert(baton.clone(), stream);
            Some(baton)
        };

        Ok(PipelineResp { baton, base_url: None, results })
    }
}
