//! Wire models for the pipeline protocol.
//!
//! One HTTP POST carries a [`PipelineReq`] with an ordered list of stream
//! requests and returns a [`PipelineResp`] with one result per request. The
//! `baton` is an opaque token the service hands back to bind later exchanges
//! to the same server-side stream; the optional `base_url` pins those
//! exchanges to a specific replica. Both are round-tripped verbatim.
//!
//! Integers travel as decimal strings so the full 64-bit range survives
//! JSON; blobs travel base64-encoded.

use serde::{Deserialize, Serialize};

/// One pipeline exchange: zero or more stream requests executed in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReq {
    /// Stream token from a previous exchange, or `None` to open a new stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baton: Option<String>,

    /// Requests executed in submission order.
    pub requests: Vec<StreamRequest>,
}

/// A single request within a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamRequest {
    /// Execute one statement.
    Execute { stmt: Stmt },

    /// Execute a batch of conditional steps.
    Batch { batch: Batch },

    /// Close the stream, releasing the server-side resources it holds.
    Close,
}

/// A SQL statement with positional arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    /// SQL text.
    pub sql: String,

    /// Positional parameter values bound in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<WireValue>,

    /// Whether the server should return result rows.
    pub want_rows: bool,
}

impl Stmt {
    pub fn new(sql: impl Into<String>, args: Vec<WireValue>, want_rows: bool) -> Self {
        Self { sql: sql.into(), args, want_rows }
    }
}

/// An ordered list of batch steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub steps: Vec<BatchStep>,
}

/// One step of a batch: a statement guarded by an optional condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStep {
    /// When present, the step runs only if the condition holds; otherwise it
    /// is skipped and its result slot is null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<BatchCond>,

    pub stmt: Stmt,
}

/// Condition over the outcome of earlier steps in the same batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchCond {
    /// Step at `step` (zero-based) completed successfully.
    Ok { step: usize },

    /// Negation of the inner condition.
    Not { cond: Box<BatchCond> },
}

/// A typed value in its wire encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireValue {
    Null,
    /// 64-bit integer carried as a decimal string.
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    /// Binary data carried base64-encoded.
    Blob { base64: String },
}

/// Response to one pipeline exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResp {
    /// Token to attach to the next exchange on this stream; `None` means the
    /// stream is closed.
    #[serde(default)]
    pub baton: Option<String>,

    /// When present, later exchanges on this stream must go to this URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// One result per request, in request order.
    pub results: Vec<StreamResult>,
}

/// Outcome of one stream request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: WireError },
}

/// Successful response payload, by request kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamResponse {
    Execute { result: StmtResult },
    Batch { result: BatchResult },
    Close,
}

/// Result of executing one statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StmtResult {
    /// Column metadata in wire order.
    #[serde(default)]
    pub cols: Vec<Col>,

    /// Row data; each row is parallel to `cols`.
    #[serde(default)]
    pub rows: Vec<Vec<WireValue>>,

    /// Rows affected by a write statement.
    #[serde(default)]
    pub affected_row_count: u64,

    /// Rowid of the last insert, as a decimal string.
    #[serde(default)]
    pub last_insert_rowid: Option<String>,
}

/// Column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Col {
    pub name: String,

    /// Declared type from the schema; absent for computed expressions.
    #[serde(default)]
    pub decltype: Option<String>,
}

/// Result of a batch request: parallel nullable arrays, one slot per step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(default)]
    pub step_results: Vec<Option<StmtResult>>,

    #[serde(default)]
    pub step_errors: Vec<Option<WireError>>,
}

/// Error payload reported by the service for a statement or stream request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execute_request_shape() {
        let req = PipelineReq {
            baton: None,
            requests: vec![
                StreamRequest::Execute {
                    stmt: Stmt::new(
                        "SELECT * FROM users WHERE id = ?",
                        vec![WireValue::Integer { value: "42".into() }],
                        true,
                    ),
                },
                StreamRequest::Close,
            ],
        };

        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({
                "requests": [
                    {
                        "type": "execute",
                        "stmt": {
                            "sql": "SELECT * FROM users WHERE id = ?",
                            "args": [{"type": "integer", "value": "42"}],
                            "want_rows": true
                        }
                    },
                    {"type": "close"}
                ]
            })
        );
    }

    #[test]
    fn batch_condition_shape() {
        let cond = BatchCond::Not { cond: Box::new(BatchCond::Ok { step: 3 }) };
        let encoded = serde_json::to_value(&cond).unwrap();
        assert_eq!(
            encoded,
            json!({"type": "not", "cond": {"type": "ok", "step": 3}})
        );
    }

    #[test]
    fn response_decodes_execute_result() {
        let body = json!({
            "baton": "tkn-1",
            "base_url": null,
            "results": [
                {
                    "type": "ok",
                    "response": {
                        "type": "execute",
                        "result": {
                            "cols": [{"name": "id", "decltype": "INTEGER"}],
                            "rows": [[{"type": "integer", "value": "7"}]],
                            "affected_row_count": 0,
                            "last_insert_rowid": null
                        }
                    }
                }
            ]
        });

        let resp: PipelineResp = serde_json::from_value(body).unwrap();
        assert_eq!(resp.baton.as_deref(), Some("tkn-1"));
        match &resp.results[0] {
            StreamResult::Ok { response: StreamResponse::Execute { result } } => {
                assert_eq!(result.cols[0].name, "id");
                assert_eq!(result.rows.len(), 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn response_decodes_stream_error() {
        let body = json!({
            "baton": null,
            "results": [
                {"type": "error", "error": {"message": "no such table: missing", "code": "SQLITE_ERROR"}}
            ]
        });

        let resp: PipelineResp = serde_json::from_value(body).unwrap();
        match &resp.results[0] {
            StreamResult::Error { error } => {
                assert_eq!(error.message, "no such table: missing");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
