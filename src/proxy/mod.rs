// Proxy module - Pingora ProxyHttp implementation
// Serves thumbnails directly from request_filter; nothing is proxied upstream

use async_trait::async_trait;
use bytes::Bytes;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::ResponseHeader;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Instant;

use crate::pipeline::RequestContext;
use crate::thumbnail::{RequestOrchestrator, ResponseEnvelope};

pub mod helpers;
pub mod special_endpoints;

use helpers::{extract_query_params, get_client_ip, strip_route_prefix};
use special_endpoints::{handle_health, handle_method_not_allowed, handle_not_found, HEALTH_PATH};

/// ResinProxy implements the Pingora ProxyHttp trait
/// Routes thumbnail requests to the orchestrator and answers them in place
pub struct ResinProxy {
    orchestrator: Arc<RequestOrchestrator>,
    route_prefix: String,
    /// Proxy start time (for uptime calculation in /health endpoint)
    start_time: Instant,
}

impl ResinProxy {
    pub fn new(orchestrator: Arc<RequestOrchestrator>) -> Self {
        let route_prefix = orchestrator.config().server.route_prefix.clone();
        Self {
            orchestrator,
            route_prefix,
            start_time: Instant::now(),
        }
    }

    /// Route a request to the envelope that answers it
    pub async fn respond(&self, ctx: &RequestContext, raw_path: &str) -> ResponseEnvelope {
        if raw_path == HEALTH_PATH {
            return handle_health(self.start_time);
        }

        if !matches!(ctx.method(), "GET" | "HEAD") {
            return handle_method_not_allowed();
        }

        if strip_route_prefix(raw_path, &self.route_prefix).is_none() {
            return handle_not_found();
        }

        self.orchestrator.handle(ctx).await
    }
}

/// HEAD responses carry the GET headers without a body
fn includes_body(method: &str) -> bool {
    method != "HEAD"
}

/// Response header for an envelope; Content-Length is the full body length
/// even when the body is not sent
fn response_header(envelope: &ResponseEnvelope) -> Result<ResponseHeader> {
    let mut header = ResponseHeader::build(envelope.status, None)?;
    for (name, value) in &envelope.headers {
        header.insert_header(*name, value.as_str())?;
    }
    header.insert_header("Content-Length", envelope.body_bytes().len().to_string())?;
    Ok(header)
}

/// Write a complete envelope to the session
async fn write_envelope(
    session: &mut Session,
    envelope: &ResponseEnvelope,
    include_body: bool,
) -> Result<()> {
    let header = response_header(envelope)?;
    let body = Bytes::copy_from_slice(envelope.body_bytes());

    session
        .write_response_header(Box::new(header), !include_body)
        .await?;
    if include_body {
        session.write_response_body(Some(body), true).await?;
    }

    Ok(())
}

#[async_trait]
impl ProxyHttp for ResinProxy {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new("GET".to_string(), "/".to_string())
    }

    /// Never reached: every request is answered in request_filter
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        tracing::error!(request_id = %ctx.request_id(), "No upstream for thumbnail service");
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "Thumbnail service has no upstream",
        ))
    }

    /// Parse the request into the context and answer it
    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        let method = req.method.as_str().to_string();
        let raw_path = req.uri.path().to_string();
        let query_params = extract_query_params(req);

        let thumbnail_path = strip_route_prefix(&raw_path, &self.route_prefix)
            .unwrap_or_default()
            .to_string();

        *ctx = RequestContext::with_query_params(method, thumbnail_path, query_params)
            .with_client_ip(get_client_ip(session));

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %raw_path,
            client_ip = ?ctx.client_ip(),
            "Incoming request"
        );

        let envelope = self.respond(ctx, &raw_path).await;
        let include_body = includes_body(ctx.method());
        write_envelope(session, &envelope, include_body).await?;

        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        _e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .unwrap_or(500);

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            client_ip = ?ctx.client_ip(),
            status = status_code,
            "Request completed"
        );
    }
}
