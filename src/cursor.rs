//! Lazy row cursor over a dedicated server-side stream.

use crate::proto::{PipelineReq, StreamRequest};
use crate::rows::{ResultSet, Row};
use crate::transport::Transport;
use log::{debug, warn};
use std::collections::VecDeque;
use std::sync::Arc;

/// A finite, non-restartable cursor over one statement's rows.
///
/// The cursor holds the stream token for the server-side resource backing it.
/// Exhausting the cursor releases the stream; dropping it early releases the
/// stream in the background rather than leaking it until the server times it
/// out. A new cursor is obtained by calling `iterate` again.
pub struct Rows {
    transport: Arc<dyn Transport>,
    /// Stream to release; `None` once released (or never opened).
    baton: Option<String>,
    base_url: Option<String>,
    columns: Vec<String>,
    buffered: VecDeque<Row>,
}

impl Rows {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        baton: Option<String>,
        base_url: Option<String>,
        result: ResultSet,
    ) -> Self {
        Self {
            transport,
            baton,
            base_url,
            columns: result.columns,
            buffered: result.rows.into(),
        }
    }

    /// Next row, or `None` once the cursor is exhausted. Exhaustion releases
    /// the underlying stream.
    pub async fn next(&mut self) -> crate::Result<Option<Row>> {
        if let Some(row) = self.buffered.pop_front() {
            return Ok(Some(row));
        }
        self.close().await;
        Ok(None)
    }

    /// Column names in wire order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Release the server-side stream. Idempotent; close failures are logged
    /// rather than surfaced, the stream is gone either way.
    pub async fn close(&mut self) {
        let Some(baton) = self.baton.take() else { return };
        let base_url = self.base_url.take();
        let req = PipelineReq { baton: Some(baton), requests: vec![StreamRequest::Close] };
        if let Err(err) = self.transport.roundtrip(&req, base_url.as_deref()).await {
            warn!("[CURSOR] Failed to close stream: {err}");
        }
    }
}

impl Drop for Rows {
    fn drop(&mut self) {
        let Some(baton) = self.baton.take() else { return };
        let base_url = self.base_url.take();
        let transport = Arc::clone(&self.transport);

        // Release the remote stream without blocking the dropping task. If no
        // runtime is available the server's stream timeout is the fallback.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let req = PipelineReq { baton: Some(baton), requests: vec![StreamRequest::Close] };
                if let Err(err) = transport.roundtrip(&req, base_url.as_deref()).await {
                    debug!("[CURSOR] Close after drop failed: {err}");
                }
            });
        } else {
            warn!("[CURSOR] Dropped outside a runtime; stream release deferred to server timeout");
        }
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("columns", &self.columns)
            .field("buffered", &self.buffered.len())
            .field("stream_open", &self.baton.is_some())
            .finish()
    }
}
