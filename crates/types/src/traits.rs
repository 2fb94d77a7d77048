//! Async traits shared across all hubgate crates.
//!
//! Every cross-crate abstraction is defined here so that higher layers depend
//! only on `hubgate-types`, not on each other.

use crate::Payload;
use async_trait::async_trait;
use http::HeaderMap;

pub use crate::error::Result;

/// Supplies bearer tokens for upstream calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a token that is valid for at least the provider's safety margin,
    /// refreshing it if necessary.
    async fn get_token(&self) -> Result<String>;

    /// Forget the current token so the next [`Self::get_token`] fetches a
    /// new one. Called after the upstream rejected a token with 401.
    fn invalidate(&self) {}
}

/// How a successful upstream body must be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Text,
}

/// A successful (status 200) upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Payload,
}

impl UpstreamResponse {
    /// Value of the `Link` header, if present and valid UTF-8.
    #[must_use]
    pub fn link_header(&self) -> Option<&str> {
        self.headers
            .get(http::header::LINK)
            .and_then(|v| v.to_str().ok())
    }
}

/// Performs one authenticated GET against the time-series service.
///
/// Non-200 replies come back as [`crate::HubError::Upstream`], never as a
/// panic or a half-filled success value.
#[async_trait]
pub trait UpstreamInvoker: Send + Sync {
    /// Fetch `url` with `token` as bearer credential, decoding the body as
    /// `kind`.
    async fn invoke(&self, url: &str, token: &str, kind: BodyKind) -> Result<UpstreamResponse>;
}
