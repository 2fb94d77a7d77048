//! Stream routes.

use crate::{AppState, error::ApiError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use hubgate_series::StreamListArgs;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowQuery {
    pub start_index: String,
    pub end_index: String,
}

/// `GET /v1/namespaces/{ns}/streams`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
    Query(args): Query<StreamListArgs>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.series.streams(Some(&namespace), args).await?))
}

/// `GET /v1/namespaces/{ns}/streams/{stream_id}`
pub async fn one(
    State(state): State<Arc<AppState>>,
    Path((namespace, stream_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.series.stream(Some(&namespace), &stream_id).await?))
}

/// `GET /v1/namespaces/{ns}/streams/{stream_id}/data`
pub async fn window(
    State(state): State<Arc<AppState>>,
    Path((namespace, stream_id)): Path<(String, String)>,
    Query(q): Query<WindowQuery>,
) -> Result<Json<Value>, ApiError> {
    let values = state
        .series
        .stream_window(Some(&namespace), &stream_id, &q.start_index, &q.end_index)
        .await?;
    Ok(Json(values))
}

/// `GET /v1/namespaces/{ns}/streams/{stream_id}/data/first`
pub async fn first(
    State(state): State<Arc<AppState>>,
    Path((namespace, stream_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        state.series.stream_first(Some(&namespace), &stream_id).await?,
    ))
}

/// `GET /v1/namespaces/{ns}/streams/{stream_id}/data/last`
pub async fn last(
    State(state): State<Arc<AppState>>,
    Path((namespace, stream_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(
        state.series.stream_last(Some(&namespace), &stream_id).await?,
    ))
}
