//! Batch field resolution: `POST /v1/resolve`.
//!
//! A request names several fields, each with its own parent and arguments.
//! Fields are resolved concurrently and every field gets its own result or
//! error entry, in request order.

use crate::{AppState, error::ApiError};
use axum::{Json, extract::State};
use futures_util::future::join_all;
use hubgate_series::{InterpolatedArgs, StoredArgs, StreamListArgs, TimeSeriesProxy};
use hubgate_types::{HubError, traits::Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// One requested field, tagged by `field`.
#[derive(Debug, Deserialize)]
#[serde(tag = "field", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FieldRequest {
    Stored {
        /// Parent dataview id.
        id: Option<String>,
        #[serde(flatten)]
        args: StoredArgs,
    },
    Interpolated {
        id: Option<String>,
        #[serde(flatten)]
        args: InterpolatedArgs,
    },
    ResolvedItems {
        id: Option<String>,
        namespace: String,
        query_id: String,
    },
    Streams {
        namespace: Option<String>,
        #[serde(flatten)]
        args: StreamListArgs,
    },
    Stream {
        namespace: Option<String>,
        stream_id: String,
    },
    StreamWindow {
        namespace: Option<String>,
        stream_id: String,
        start_index: String,
        end_index: String,
    },
    StreamFirst {
        namespace: Option<String>,
        stream_id: String,
    },
    StreamLast {
        namespace: Option<String>,
        stream_id: String,
    },
}

impl FieldRequest {
    async fn resolve(self, series: &TimeSeriesProxy) -> Result<Value> {
        match self {
            Self::Stored { id, args } => series.stored(id.as_deref(), args).await.and_then(to_value),
            Self::Interpolated { id, args } => series
                .interpolated(id.as_deref(), args)
                .await
                .and_then(to_value),
            Self::ResolvedItems {
                id,
                namespace,
                query_id,
            } => {
                series
                    .resolved_items(id.as_deref(), &namespace, &query_id)
                    .await
            }
            Self::Streams { namespace, args } => series.streams(namespace.as_deref(), args).await,
            Self::Stream {
                namespace,
                stream_id,
            } => series.stream(namespace.as_deref(), &stream_id).await,
            Self::StreamWindow {
                namespace,
                stream_id,
                start_index,
                end_index,
            } => {
                series
                    .stream_window(namespace.as_deref(), &stream_id, &start_index, &end_index)
                    .await
            }
            Self::StreamFirst {
                namespace,
                stream_id,
            } => series.stream_first(namespace.as_deref(), &stream_id).await,
            Self::StreamLast {
                namespace,
                stream_id,
            } => series.stream_last(namespace.as_deref(), &stream_id).await,
        }
    }
}

fn to_value<T: Serialize>(v: T) -> Result<Value> {
    serde_json::to_value(v).map_err(|e| HubError::Decode(e.to_string()))
}

/// Request body of `POST /v1/resolve`.
///
/// Fields stay raw so a malformed entry fails alone instead of rejecting
/// the whole batch.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub fields: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub results: Vec<Value>,
}

/// `POST /v1/resolve`
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let series = &state.series;
    let results = join_all(req.fields.into_iter().map(|raw| async move {
        let field = match serde_json::from_value::<FieldRequest>(raw) {
            Ok(field) => field,
            Err(e) => return invalid_field(&e),
        };
        match field.resolve(series).await {
            Ok(value) => value,
            Err(e) => ApiError(e).body(),
        }
    }))
    .await;
    Json(ResolveResponse { results })
}

fn invalid_field(e: &serde_json::Error) -> Value {
    json!({
        "error": {
            "message": format!("invalid field request: {e}"),
            "type": "invalid_request_error",
            "code": "invalid_field",
        }
    })
}
