//! API error type that maps [`HubError`] variants to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hubgate_types::HubError;
use serde_json::{Value, json};

/// Wrapper around [`HubError`] that implements [`IntoResponse`].
#[derive(Debug)]
pub struct ApiError(pub HubError);

impl ApiError {
    /// Returns `(status, error_type, error_code)` for the wrapped error.
    fn classify(&self) -> (StatusCode, &'static str, &'static str) {
        match &self.0 {
            HubError::MissingIdentifier(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "missing_identifier",
            ),
            HubError::MissingNamespace => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "missing_namespace",
            ),
            HubError::InvalidArgument(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "invalid_argument",
            ),
            HubError::AuthFetch(_) => (
                StatusCode::BAD_GATEWAY,
                "authentication_error",
                "token_fetch_failed",
            ),
            HubError::Transport(_) if self.0.is_timeout() => (
                StatusCode::GATEWAY_TIMEOUT,
                "server_error",
                "upstream_timeout",
            ),
            HubError::Transport(_) => (
                StatusCode::BAD_GATEWAY,
                "server_error",
                "upstream_unreachable",
            ),
            HubError::Upstream(e) => classify_upstream(e.status),
            HubError::Decode(_) => (StatusCode::BAD_GATEWAY, "server_error", "decode_error"),
            HubError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "internal_error",
            ),
        }
    }

    /// HTTP status this error is reported with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.classify().0
    }

    /// The `{"error": {...}}` document sent to clients.
    ///
    /// Upstream failures additionally carry the service's status, reason,
    /// message and operation id under `error.upstream`.
    #[must_use]
    pub fn body(&self) -> Value {
        let (_, error_type, error_code) = self.classify();
        let mut error = json!({
            "message": self.0.to_string(),
            "type": error_type,
            "code": error_code,
        });
        if let HubError::Upstream(e) = &self.0 {
            error["upstream"] = json!({
                "status": e.status,
                "reason": e.reason,
                "message": e.message,
                "operationId": e.operation_id,
            });
        }
        json!({ "error": error })
    }
}

/// Upstream statuses pass through; anything outside the error range is a
/// bad gateway from the client's point of view.
fn classify_upstream(status: u16) -> (StatusCode, &'static str, &'static str) {
    let code = match status {
        401 => "upstream_unauthorized",
        403 => "upstream_forbidden",
        404 => "not_found",
        429 => "rate_limit_exceeded",
        _ => "upstream_error",
    };
    let status = match StatusCode::from_u16(status) {
        Ok(s) if s.is_client_error() || s.is_server_error() => s,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, "upstream_error", code)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        Self(e)
    }
}
