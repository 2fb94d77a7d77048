//! Unified error type for the hubgate workspace.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Enumerates all error kinds that can occur across hubgate crates.
///
/// Every variant is returned as a value; nothing in the proxy retries on its
/// own, so callers decide what to do with each kind.
#[derive(Debug, Error)]
pub enum HubError {
    /// The accessor needs a parent dataview id and none was supplied.
    #[error("missing identifier: {0} is required (add the id field to the query)")]
    MissingIdentifier(&'static str),

    /// A stream accessor was called without a namespace.
    #[error("missing namespace: stream access requires a namespace id")]
    MissingNamespace,

    /// A required argument was supplied but is blank or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The identity endpoint could not be reached or refused the grant.
    #[error("token fetch failed: {0}")]
    AuthFetch(String),

    /// Network failure or timeout while talking to the time-series service.
    #[error("transport error: {0}")]
    Transport(String),

    /// The time-series service replied with a non-200 status.
    #[error(transparent)]
    Upstream(Box<UpstreamHttpError>),

    /// A 200 reply whose body does not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Structured description of a non-200 upstream reply.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("upstream error: {status} {reason} (url={url}, operation_id={})", .operation_id.as_deref().unwrap_or("-"))]
pub struct UpstreamHttpError {
    /// HTTP status returned by the service.
    pub status: u16,
    /// Canonical reason phrase for `status` (empty when unknown).
    pub reason: String,
    /// Raw response body, best effort.
    pub message: String,
    /// Value of the `Operation-Id` response header, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Response headers, lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// The URL that was requested.
    pub url: String,
}

/// Prefix of [`HubError::Transport`] messages produced by client timeouts.
pub const TIMED_OUT: &str = "request timed out";

// ── Feature-gated From impls ──────────────────────────────────────────────────

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for HubError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("{TIMED_OUT}: {e}"))
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<UpstreamHttpError> for HubError {
    fn from(e: UpstreamHttpError) -> Self {
        Self::Upstream(Box::new(e))
    }
}

impl HubError {
    /// Returns `true` if the error is likely transient and worth retrying.
    ///
    /// The proxy itself never retries; this is a hint for callers.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(e) => matches!(e.status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::Transport(_) | Self::AuthFetch(_) => true,
            _ => false,
        }
    }

    /// Returns `true` when the upstream rejected the bearer token.
    ///
    /// A request that started just before the cached credential expired may
    /// observe one such failure.
    #[must_use]
    pub fn is_stale_token(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.status == 401)
    }

    /// Returns `true` for transport errors caused by a client-side timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(msg) if msg.starts_with(TIMED_OUT))
    }

    /// The upstream status, if this is an upstream HTTP error.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HubError>;
