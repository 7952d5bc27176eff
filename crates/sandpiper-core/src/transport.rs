//! HTTP transport for control-plane calls.
//!
//! One [`Transport::send`] call is one HTTP exchange. The transport never
//! retries; retry policy, if any, belongs to whoever wraps the reconciler.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::request::ApiRequest;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request};
use hyper_tls::HttpsConnector;
use std::time::Duration;
use tokio::time::timeout;

/// Decoded control-plane response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body; `Null` when the response body was empty.
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Surface an error status as [`ClientError::Api`].
    ///
    /// Every reconciler step passes its response through here immediately
    /// after `send`, so no action decision proceeds past an error response.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status >= 400 {
            return Err(ClientError::Api {
                status: self.status,
                body: self.body,
            });
        }
        Ok(self)
    }
}

/// One HTTP call against the configured control plane.
///
/// The trait is the seam between the reconciler and the network; tests
/// substitute scripted stubs for the hyper-backed implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatch the request and decode the response body as JSON.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// hyper-backed transport speaking JSON over HTTPS.
pub struct HttpTransport {
    base_url: String,
    token: String,
    request_timeout: Duration,
    client: Client<HttpsConnector<HttpConnector>>,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        let https = HttpsConnector::new();
        Self {
            base_url: config.endpoint.clone(),
            token: config.token.clone(),
            request_timeout: config.request_timeout,
            client: Client::builder().build::<_, Body>(https),
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let start = std::time::Instant::now();
        let url = self.url_for(&request.path);
        tracing::debug!(method = request.method.as_str(), url = %url, "Sending control-plane request");

        let body = match &request.body {
            Some(envelope) => Body::from(serde_json::to_vec(envelope)?),
            None => Body::empty(),
        };
        let http_request = Request::builder()
            .method(request.method.as_str())
            .uri(url.as_str())
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("If-Match", request.if_match.as_str())
            .body(body)
            .map_err(|e| ClientError::Transport(format!("failed to build request: {e}")))?;

        let response = timeout(self.request_timeout, self.client.request(http_request))
            .await
            .map_err(|_| {
                tracing::warn!(url = %url, timeout_secs = self.request_timeout.as_secs(), "Request timed out");
                ClientError::Transport(format!(
                    "request to {url} timed out after {:?}",
                    self.request_timeout
                ))
            })?
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "Control-plane request failed");
                ClientError::Transport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;
        let body = decode_body(status, &bytes, &request.path)?;

        tracing::debug!(
            status,
            path = %request.path,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Control-plane response"
        );
        Ok(ApiResponse { status, body })
    }
}

/// Decode a response body.
///
/// Empty bodies decode as `Null` (202 responses may be bodyless). Error
/// statuses with a non-JSON body are preserved as a string so the caller
/// still sees what the control plane said; a non-JSON body on a success
/// status is a broken exchange and fails the attempt.
fn decode_body(status: u16, bytes: &Bytes, path: &str) -> Result<serde_json::Value> {
    if bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(_) if status >= 400 => Ok(serde_json::Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        Err(e) => Err(ClientError::Transport(format!(
            "non-JSON response body from {path}: {e}"
        ))),
    }
}
