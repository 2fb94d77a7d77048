//! Upstream URL construction for every accessor kind.

use hubgate_types::{BodyKind, HubError, traits::Result};
use reqwest::Url;
use serde::Deserialize;

/// Page size requested for resolved data items.
pub const RESOLVED_ITEMS_COUNT: &str = "1000";

/// Default page size for stream listings.
pub const STREAM_LIST_COUNT: u32 = 1000;

/// Arguments of the `stored` accessor.
///
/// Missing fields deserialize as blank; a blank namespace is rejected when
/// the request is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredArgs {
    pub namespace: String,
    pub start_index: String,
    pub end_index: String,
    /// Continuation URL returned by a previous page.
    pub next_page: Option<String>,
    /// Upstream page size; only sent when positive.
    pub count: Option<i64>,
}

/// Arguments of the `interpolated` accessor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpolatedArgs {
    pub namespace: String,
    pub start_index: String,
    pub end_index: String,
    /// Interpolation interval, e.g. `00:05:00`.
    pub interpolation: String,
    pub next_page: Option<String>,
    pub count: Option<i64>,
}

/// Arguments of the stream listing accessor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamListArgs {
    pub skip: Option<u32>,
    pub count: Option<u32>,
    /// Free-text search, e.g. `name:*FV31*`.
    pub query: Option<String>,
}

/// One upstream operation with its own parameters.
#[derive(Debug, Clone)]
pub enum SeriesRequest {
    Stored(StoredArgs),
    Interpolated(InterpolatedArgs),
    ResolvedItems {
        namespace: String,
        query_id: String,
    },
    StreamList(StreamListArgs),
    StreamOne {
        stream_id: String,
    },
    StreamWindow {
        stream_id: String,
        start_index: String,
        end_index: String,
    },
    StreamFirst {
        stream_id: String,
    },
    StreamLast {
        stream_id: String,
    },
}

impl SeriesRequest {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stored(_) => "stored",
            Self::Interpolated(_) => "interpolated",
            Self::ResolvedItems { .. } => "resolvedItems",
            Self::StreamList(_) => "streamList",
            Self::StreamOne { .. } => "streamOne",
            Self::StreamWindow { .. } => "streamWindow",
            Self::StreamFirst { .. } => "streamFirst",
            Self::StreamLast { .. } => "streamLast",
        }
    }

    /// How the upstream body of this kind is decoded.
    #[must_use]
    pub fn body_kind(&self) -> BodyKind {
        match self {
            Self::Interpolated(_) => BodyKind::Text,
            _ => BodyKind::Json,
        }
    }

    /// Whether pagination cursors are surfaced for this kind.
    #[must_use]
    pub fn is_paged(&self) -> bool {
        matches!(self, Self::Stored(_) | Self::Interpolated(_))
    }

    /// `true` for kinds whose parent is a namespace rather than a dataview.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(
            self,
            Self::StreamList(_)
                | Self::StreamOne { .. }
                | Self::StreamWindow { .. }
                | Self::StreamFirst { .. }
                | Self::StreamLast { .. }
        )
    }

    /// Namespace argument of the dataview kinds.
    fn namespace(&self) -> Option<&str> {
        match self {
            Self::Stored(a) => Some(&a.namespace),
            Self::Interpolated(a) => Some(&a.namespace),
            Self::ResolvedItems { namespace, .. } => Some(namespace),
            _ => None,
        }
    }

    fn continuation(&self) -> Option<&str> {
        match self {
            Self::Stored(a) => a.next_page.as_deref(),
            Self::Interpolated(a) => a.next_page.as_deref(),
            _ => None,
        }
        .filter(|u| !u.trim().is_empty())
    }
}

/// Builds upstream URLs below the tenant's namespaces root.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    namespaces_url: Url,
}

impl RequestBuilder {
    /// `namespaces_url` is `<resource>/api/<version>/Tenants/<tenant>/Namespaces`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] if the URL cannot serve as a base.
    pub fn new(namespaces_url: &str) -> Result<Self> {
        let url = Url::parse(namespaces_url)
            .map_err(|e| HubError::Config(format!("invalid upstream url '{namespaces_url}': {e}")))?;
        if url.cannot_be_a_base() {
            return Err(HubError::Config(format!(
                "upstream url '{namespaces_url}' cannot be a base"
            )));
        }
        Ok(Self {
            namespaces_url: url,
        })
    }

    /// The URL for `request`. `parent` is the dataview id for dataview kinds
    /// and the namespace id for stream kinds.
    ///
    /// A continuation URL, when present, is returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::MissingIdentifier`] or
    /// [`HubError::MissingNamespace`] when `parent` is absent or blank, and
    /// [`HubError::InvalidArgument`] for an interpolated read without an
    /// interval.
    pub fn build(&self, parent: Option<&str>, request: &SeriesRequest) -> Result<String> {
        let parent = parent.map(str::trim).filter(|p| !p.is_empty());
        let Some(parent) = parent else {
            return Err(if request.is_stream() {
                HubError::MissingNamespace
            } else {
                HubError::MissingIdentifier("dataview id")
            });
        };

        if let Some(next) = request.continuation() {
            return Ok(next.to_string());
        }
        if request.namespace().is_some_and(|ns| ns.trim().is_empty()) {
            return Err(HubError::MissingNamespace);
        }
        if let SeriesRequest::Interpolated(a) = request
            && a.interpolation.trim().is_empty()
        {
            return Err(HubError::InvalidArgument(
                "interpolation must not be blank".into(),
            ));
        }

        let mut url = self.namespaces_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| HubError::Config("upstream url cannot be a base".into()))?;
            segments.pop_if_empty();
            match request {
                SeriesRequest::Stored(a) => {
                    let dataview = format!("{parent}_narrow");
                    segments.extend([a.namespace.as_str(), "dataviews", dataview.as_str(), "data", "stored"]);
                }
                SeriesRequest::Interpolated(a) => {
                    segments.extend([a.namespace.as_str(), "dataviews", parent, "data", "interpolated"]);
                }
                SeriesRequest::ResolvedItems {
                    namespace,
                    query_id,
                } => {
                    segments.extend([
                        namespace.as_str(),
                        "dataviews",
                        parent,
                        "Resolved",
                        "DataItems",
                        query_id.as_str(),
                    ]);
                }
                SeriesRequest::StreamList(_) => {
                    segments.extend([parent, "Streams"]);
                }
                SeriesRequest::StreamOne { stream_id } => {
                    segments.extend([parent, "Streams", stream_id.as_str()]);
                }
                SeriesRequest::StreamWindow { stream_id, .. } => {
                    segments.extend([parent, "Streams", stream_id.as_str(), "Data"]);
                }
                SeriesRequest::StreamFirst { stream_id } => {
                    segments.extend([parent, "Streams", stream_id.as_str(), "Data", "First"]);
                }
                SeriesRequest::StreamLast { stream_id } => {
                    segments.extend([parent, "Streams", stream_id.as_str(), "Data", "Last"]);
                }
            }
        }

        let query = query_pairs(request);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }
}

/// Query parameters for `request`, in the order they are sent.
fn query_pairs(request: &SeriesRequest) -> Vec<(&'static str, String)> {
    let mut q = Vec::new();
    match request {
        SeriesRequest::Stored(a) => {
            q.push(("startIndex", a.start_index.clone()));
            q.push(("endIndex", a.end_index.clone()));
            q.push(("form", "tableh".to_string()));
            if let Some(count) = a.count.filter(|c| *c > 0) {
                q.push(("count", count.to_string()));
            }
        }
        SeriesRequest::Interpolated(a) => {
            q.push(("startIndex", a.start_index.clone()));
            q.push(("endIndex", a.end_index.clone()));
            q.push(("form", "csvh".to_string()));
            q.push(("interval", a.interpolation.clone()));
            if let Some(count) = a.count.filter(|c| *c > 0) {
                q.push(("count", count.to_string()));
            }
        }
        SeriesRequest::ResolvedItems { .. } => {
            q.push(("count", RESOLVED_ITEMS_COUNT.to_string()));
            q.push(("cache", "refresh".to_string()));
        }
        SeriesRequest::StreamList(a) => {
            if let Some(skip) = a.skip {
                q.push(("skip", skip.to_string()));
            }
            q.push(("count", a.count.unwrap_or(STREAM_LIST_COUNT).to_string()));
            if let Some(query) = a.query.as_deref().filter(|s| !s.is_empty()) {
                q.push(("query", query.to_string()));
            }
        }
        SeriesRequest::StreamWindow {
            start_index,
            end_index,
            ..
        } => {
            q.push(("startIndex", start_index.clone()));
            q.push(("endIndex", end_index.clone()));
        }
        SeriesRequest::StreamOne { .. }
        | SeriesRequest::StreamFirst { .. }
        | SeriesRequest::StreamLast { .. } => {}
    }
    q
}
