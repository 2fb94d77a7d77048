//! HTTP plumbing for time-series calls.
//!
//! One place for send → status check → decode, so every accessor reports
//! upstream failures with the same shape.

use async_trait::async_trait;
use hubgate_types::{
    BodyKind, HubError, Payload, UpstreamHttpError, UpstreamInvoker, UpstreamResponse,
    traits::Result,
};
use reqwest::{Client, StatusCode, header::HeaderMap};
use std::{collections::BTreeMap, time::Duration};

/// Response header carrying the upstream's request correlation id.
pub const OPERATION_ID_HEADER: &str = "operation-id";

const USER_AGENT: &str = concat!("hubgate/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client with the given upper bounds.
///
/// # Errors
///
/// Returns [`HubError::Config`] if the client cannot be built (e.g. TLS
/// backend initialisation fails).
pub fn build_client(timeout: Duration, connect_timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| HubError::Config(format!("failed to build HTTP client: {e}")))
}

/// reqwest-backed [`UpstreamInvoker`].
#[derive(Clone)]
pub struct SeriesHttp {
    http: Client,
}

impl SeriesHttp {
    /// Creates a new helper wrapping the given HTTP client.
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Sends an authenticated GET and checks for status 200.
    ///
    /// On any other status, reads the body text and returns
    /// [`HubError::Upstream`].
    ///
    /// # Errors
    ///
    /// Returns `HubError::Upstream` on non-200 status codes, or
    /// `HubError::Transport` if the request fails to send or times out.
    pub async fn send(&self, url: &str, token: &str) -> Result<reqwest::Response> {
        tracing::debug!(url, "upstream request");
        let resp = self.http.get(url).bearer_auth(token).send().await?;
        if resp.status() == StatusCode::OK {
            Ok(resp)
        } else {
            Err(upstream_error(url, resp).await)
        }
    }
}

#[async_trait]
impl UpstreamInvoker for SeriesHttp {
    async fn invoke(&self, url: &str, token: &str, kind: BodyKind) -> Result<UpstreamResponse> {
        let resp = self.send(url, token).await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = match kind {
            BodyKind::Json => {
                let bytes = resp.bytes().await.map_err(transport)?;
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| HubError::Decode(format!("invalid JSON from {url}: {e}")))?;
                Payload::Json(value)
            }
            BodyKind::Text => Payload::Text(resp.text().await.map_err(transport)?),
        };
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Body read failures after a 200 are connection problems, not decode errors.
fn transport(e: reqwest::Error) -> HubError {
    HubError::Transport(e.to_string())
}

async fn upstream_error(url: &str, resp: reqwest::Response) -> HubError {
    let status = resp.status();
    let headers = flatten_headers(resp.headers());
    let operation_id = headers.get(OPERATION_ID_HEADER).cloned();
    let message = resp.text().await.unwrap_or_default();

    tracing::warn!(
        status = status.as_u16(),
        operation_id = operation_id.as_deref().unwrap_or("-"),
        url,
        "upstream request failed"
    );

    UpstreamHttpError {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        message,
        operation_id,
        headers,
        url: url.to_string(),
    }
    .into()
}

/// Header map as name → value, repeated headers joined with `", "`.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}
