//! Dataview routes: stored and interpolated pages, resolved data items.

use crate::{AppState, error::ApiError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use hubgate_series::{InterpolatedArgs, StoredArgs};
use hubgate_types::ProxyResult;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Query string shared by the paged dataview routes.
///
/// `startIndex` and `endIndex` may be omitted when `nextPage` is given.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageQuery {
    pub start_index: String,
    pub end_index: String,
    pub next_page: Option<String>,
    pub count: Option<i64>,
    pub interpolation: Option<String>,
}

/// `GET /v1/namespaces/{ns}/dataviews/{id}/stored`
pub async fn stored(
    State(state): State<Arc<AppState>>,
    Path((namespace, dataview_id)): Path<(String, String)>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ProxyResult>, ApiError> {
    let args = StoredArgs {
        namespace,
        start_index: q.start_index,
        end_index: q.end_index,
        next_page: q.next_page,
        count: q.count,
    };
    let page = state.series.stored(Some(&dataview_id), args).await?;
    Ok(Json(page))
}

/// `GET /v1/namespaces/{ns}/dataviews/{id}/interpolated`
///
/// The page's `data` is the upstream CSV text.
pub async fn interpolated(
    State(state): State<Arc<AppState>>,
    Path((namespace, dataview_id)): Path<(String, String)>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ProxyResult>, ApiError> {
    let args = InterpolatedArgs {
        namespace,
        start_index: q.start_index,
        end_index: q.end_index,
        interpolation: q.interpolation.unwrap_or_default(),
        next_page: q.next_page,
        count: q.count,
    };
    let page = state.series.interpolated(Some(&dataview_id), args).await?;
    Ok(Json(page))
}

/// `GET /v1/namespaces/{ns}/dataviews/{id}/resolved/{query_id}`
pub async fn resolved(
    State(state): State<Arc<AppState>>,
    Path((namespace, dataview_id, query_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let items = state
        .series
        .resolved_items(Some(&dataview_id), &namespace, &query_id)
        .await?;
    Ok(Json(items))
}
