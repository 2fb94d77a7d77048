//! Field accessors for dataview and stream data.
//!
//! Each accessor validates its parent identifier, builds the upstream URL,
//! fetches a token and performs one GET. Nothing here retries; failures are
//! returned as [`HubError`] values so one failing field does not abort its
//! siblings.

use crate::{
    link::PageLinks,
    request::{InterpolatedArgs, RequestBuilder, SeriesRequest, StoredArgs, StreamListArgs},
};
use hubgate_types::{
    HubError, Payload, ProxyResult, TokenProvider, UpstreamInvoker, traits::Result,
};
use serde_json::Value;
use std::sync::Arc;

/// Entry point for all time-series field accessors.
#[derive(Clone)]
pub struct TimeSeriesProxy {
    builder: RequestBuilder,
    tokens: Arc<dyn TokenProvider>,
    invoker: Arc<dyn UpstreamInvoker>,
}

impl TimeSeriesProxy {
    pub fn new(
        builder: RequestBuilder,
        tokens: Arc<dyn TokenProvider>,
        invoker: Arc<dyn UpstreamInvoker>,
    ) -> Self {
        Self {
            builder,
            tokens,
            invoker,
        }
    }

    /// Stored values of a dataview, one page at a time.
    ///
    /// # Errors
    ///
    /// [`HubError::MissingIdentifier`] when `dataview_id` is absent; otherwise
    /// any auth, transport, upstream or decode error.
    pub async fn stored(&self, dataview_id: Option<&str>, args: StoredArgs) -> Result<ProxyResult> {
        self.execute(dataview_id, &SeriesRequest::Stored(args)).await
    }

    /// Interpolated values of a dataview as CSV text with a header row.
    ///
    /// # Errors
    ///
    /// Same as [`Self::stored`].
    pub async fn interpolated(
        &self,
        dataview_id: Option<&str>,
        args: InterpolatedArgs,
    ) -> Result<ProxyResult> {
        self.execute(dataview_id, &SeriesRequest::Interpolated(args))
            .await
    }

    /// Resolved data items of a dataview for `query_id`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::stored`].
    pub async fn resolved_items(
        &self,
        dataview_id: Option<&str>,
        namespace: &str,
        query_id: &str,
    ) -> Result<Value> {
        let request = SeriesRequest::ResolvedItems {
            namespace: namespace.to_string(),
            query_id: query_id.to_string(),
        };
        self.execute_json(dataview_id, &request).await
    }

    /// Streams of a namespace.
    ///
    /// # Errors
    ///
    /// [`HubError::MissingNamespace`] when `namespace` is absent; otherwise
    /// any auth, transport, upstream or decode error.
    pub async fn streams(&self, namespace: Option<&str>, args: StreamListArgs) -> Result<Value> {
        self.execute_json(namespace, &SeriesRequest::StreamList(args))
            .await
    }

    /// One stream's definition.
    ///
    /// # Errors
    ///
    /// Same as [`Self::streams`].
    pub async fn stream(&self, namespace: Option<&str>, stream_id: &str) -> Result<Value> {
        let request = SeriesRequest::StreamOne {
            stream_id: stream_id.to_string(),
        };
        self.execute_json(namespace, &request).await
    }

    /// Stream values between two indexes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::streams`].
    pub async fn stream_window(
        &self,
        namespace: Option<&str>,
        stream_id: &str,
        start_index: &str,
        end_index: &str,
    ) -> Result<Value> {
        let request = SeriesRequest::StreamWindow {
            stream_id: stream_id.to_string(),
            start_index: start_index.to_string(),
            end_index: end_index.to_string(),
        };
        self.execute_json(namespace, &request).await
    }

    /// First value of a stream.
    ///
    /// # Errors
    ///
    /// Same as [`Self::streams`].
    pub async fn stream_first(&self, namespace: Option<&str>, stream_id: &str) -> Result<Value> {
        let request = SeriesRequest::StreamFirst {
            stream_id: stream_id.to_string(),
        };
        self.execute_json(namespace, &request).await
    }

    /// Last value of a stream.
    ///
    /// # Errors
    ///
    /// Same as [`Self::streams`].
    pub async fn stream_last(&self, namespace: Option<&str>, stream_id: &str) -> Result<Value> {
        let request = SeriesRequest::StreamLast {
            stream_id: stream_id.to_string(),
        };
        self.execute_json(namespace, &request).await
    }

    /// Runs any request kind. The URL is built (and the parent validated)
    /// before a token is requested.
    ///
    /// # Errors
    ///
    /// See the individual accessors.
    pub async fn execute(&self, parent: Option<&str>, request: &SeriesRequest) -> Result<ProxyResult> {
        let url = self.builder.build(parent, request)?;
        let token = self.tokens.get_token().await?;
        let response = match self.invoker.invoke(&url, &token, request.body_kind()).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_stale_token() {
                    tracing::debug!(kind = request.name(), "upstream rejected token, invalidating");
                    self.tokens.invalidate();
                }
                return Err(e);
            }
        };

        if !request.is_paged() {
            return Ok(ProxyResult::unpaged(response.body));
        }

        let (next_page, first_page) = PageLinks::parse(response.link_header()).into_cursors();
        tracing::debug!(
            kind = request.name(),
            has_next = next_page.is_some(),
            "upstream page received"
        );
        Ok(ProxyResult {
            data: response.body,
            next_page,
            first_page,
        })
    }

    async fn execute_json(&self, parent: Option<&str>, request: &SeriesRequest) -> Result<Value> {
        match self.execute(parent, request).await?.data {
            Payload::Json(v) => Ok(v),
            Payload::Text(t) => Err(HubError::Decode(format!(
                "expected JSON for {}, got {} bytes of text",
                request.name(),
                t.len()
            ))),
        }
    }
}
