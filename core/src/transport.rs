//! The network seam.
//!
//! A `Transport` performs one round-trip for an already-resolved request and
//! returns the response with its body read as text. It receives the composed
//! cancellation token and is expected to return `TransportError::Aborted`
//! promptly once that token fires; the executor never interrupts it by force.

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::http::{HttpMethod, HttpResponse, OutgoingRequest};

/// Failures a transport can report before a response is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The cancellation token fired before the round-trip completed.
    #[error("request aborted")]
    Aborted,

    /// No connection could be established (DNS, refused, unreachable).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request could not be sent or no response head arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// The response head arrived but reading the body failed.
    #[error("reading response body failed: {0}")]
    Body(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: OutgoingRequest,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn round_trip(&self, request: OutgoingRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect(e.to_string())
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: OutgoingRequest,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Aborted),
            result = self.round_trip(request) => result,
        }
    }
}
