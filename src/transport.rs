//! Transport collaborator: one pipeline request/response exchange.
//!
//! The protocol layer only requires a single operation — send a pipeline
//! request, receive a pipeline response — so that is the whole trait. The
//! production implementation is [`HttpTransport`] over reqwest; tests
//! substitute an in-memory fake.

use crate::auth::AuthProvider;
use crate::error::{DatabaseError, Result};
use crate::proto::{PipelineReq, PipelineResp};
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Instant;

/// A stateless request/response transport for pipeline exchanges.
///
/// `base_url_override` carries the sticky replica URL a previous response in
/// the same stream may have pinned; `None` means the configured endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn roundtrip(
        &self,
        req: &PipelineReq,
        base_url_override: Option<&str>,
    ) -> Result<PipelineResp>;
}

/// HTTP transport: `POST {base}/v2/pipeline` with a JSON body.
pub struct HttpTransport {
    base_url: String,
    http_client: reqwest::Client,
    auth: AuthProvider,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client, auth: AuthProvider) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http_client, auth }
    }

    fn pipeline_url(&self, base_url_override: Option<&str>) -> String {
        let base = base_url_override.unwrap_or(&self.base_url);
        format!("{}/v2/pipeline", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn roundtrip(
        &self,
        req: &PipelineReq,
        base_url_override: Option<&str>,
    ) -> Result<PipelineResp> {
        let url = self.pipeline_url(base_url_override);
        let start = Instant::now();
        debug!("[PIPELINE] Sending POST to {} ({} requests)", url, req.requests.len());

        let request = self.auth.apply_to_request(self.http_client.post(&url).json(req));
        let response = request.send().await?;

        let status = response.status();
        debug!(
            "[PIPELINE] Response received: status={} duration_ms={}",
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            warn!("[PIPELINE] Envelope failure: status={} body=\"{}\"", status, body);
            return Err(DatabaseError::Transport(format!(
                "request failed with status {status}: {body}"
            )));
        }

        let resp = response.json::<PipelineResp>().await?;
        if resp.results.len() != req.requests.len() {
            return Err(DatabaseError::Transport(format!(
                "malformed response: {} results for {} requests",
                resp.results.len(),
                req.requests.len()
            )));
        }
        Ok(resp)
    }
}
