//! HTTP proxy layer: axum router, handlers and error mapping.
//!
//! Exposes dataview and stream accessors under `/v1/namespaces/{ns}/…`, a
//! batch `/v1/resolve` endpoint that resolves several fields concurrently,
//! and a `/healthz` probe.

mod dataviews;
mod error;
mod resolve;
mod streams;

pub use error::ApiError;
pub use resolve::{FieldRequest, ResolveRequest, ResolveResponse};

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use hubgate_auth::CredentialCache;
use hubgate_config::Config;
use hubgate_series::{RequestBuilder, SeriesHttp, TimeSeriesProxy, build_client};
use hubgate_types::traits::Result;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state passed to all route handlers.
pub struct AppState {
    /// Server configuration (listen address, upstream, identity).
    pub config: Arc<Config>,
    /// Field accessors backed by the shared token cache and HTTP client.
    pub series: TimeSeriesProxy,
}

impl AppState {
    /// Creates a new shared application state wrapped in an `Arc`.
    pub fn new(config: Arc<Config>, series: TimeSeriesProxy) -> Arc<Self> {
        Arc::new(Self { config, series })
    }

    /// Wires the production stack: one HTTP client shared by the credential
    /// cache and the upstream invoker.
    ///
    /// # Errors
    ///
    /// Returns [`hubgate_types::HubError::Config`] when the HTTP client
    /// cannot be built or the namespaces URL is not a valid base URL.
    pub fn from_config(config: Config) -> Result<Arc<Self>> {
        let http = build_client(config.upstream.timeout(), config.upstream.connect_timeout())?;
        let credentials = Arc::new(CredentialCache::from_config(http.clone(), &config));
        let builder = RequestBuilder::new(&config.namespaces_url())?;
        let series = TimeSeriesProxy::new(builder, credentials, Arc::new(SeriesHttp::new(http)));
        Ok(Self::new(Arc::new(config), series))
    }
}

/// Build the full axum router.
///
/// Routes:
/// - GET  /v1/namespaces/{ns}/dataviews/{id}/stored
/// - GET  /v1/namespaces/{ns}/dataviews/{id}/interpolated
/// - GET  /v1/namespaces/{ns}/dataviews/{id}/resolved/{query_id}
/// - GET  /v1/namespaces/{ns}/streams
/// - GET  /v1/namespaces/{ns}/streams/{stream_id}
/// - GET  /v1/namespaces/{ns}/streams/{stream_id}/data
/// - GET  /v1/namespaces/{ns}/streams/{stream_id}/data/first
/// - GET  /v1/namespaces/{ns}/streams/{stream_id}/data/last
/// - POST /v1/resolve
/// - GET  /healthz
pub fn make_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/v1/namespaces/{ns}/dataviews/{id}/stored",
            get(dataviews::stored),
        )
        .route(
            "/v1/namespaces/{ns}/dataviews/{id}/interpolated",
            get(dataviews::interpolated),
        )
        .route(
            "/v1/namespaces/{ns}/dataviews/{id}/resolved/{query_id}",
            get(dataviews::resolved),
        )
        .route("/v1/namespaces/{ns}/streams", get(streams::list))
        .route("/v1/namespaces/{ns}/streams/{stream_id}", get(streams::one))
        .route(
            "/v1/namespaces/{ns}/streams/{stream_id}/data",
            get(streams::window),
        )
        .route(
            "/v1/namespaces/{ns}/streams/{stream_id}/data/first",
            get(streams::first),
        )
        .route(
            "/v1/namespaces/{ns}/streams/{stream_id}/data/last",
            get(streams::last),
        )
        .route("/v1/resolve", post(resolve::resolve))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tenant": state.config.upstream.tenant_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, http::StatusCode};
    use hubgate_types::{
        BodyKind, HubError, Payload, TokenProvider, UpstreamHttpError, UpstreamInvoker,
        UpstreamResponse,
    };
    use http_body_util::BodyExt as _;
    use std::{
        collections::BTreeMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tower::ServiceExt as _;

    const BASE: &str = "https://dat.example/api/v1/Tenants/t1/Namespaces";

    struct FixedToken;

    #[async_trait]
    impl TokenProvider for FixedToken {
        async fn get_token(&self) -> Result<String> {
            Ok("tok".into())
        }
    }

    /// Answers by URL: anything containing `missing` is a 404, everything
    /// else echoes the path it was asked for.
    #[derive(Default)]
    struct EchoInvoker {
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UpstreamInvoker for EchoInvoker {
        async fn invoke(&self, url: &str, _token: &str, kind: BodyKind) -> Result<UpstreamResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if url.contains("missing") {
                return Err(UpstreamHttpError {
                    status: 404,
                    reason: "Not Found".into(),
                    message: "not found".into(),
                    operation_id: Some("op-1".into()),
                    headers: BTreeMap::new(),
                    url: url.to_string(),
                }
                .into());
            }
            let mut headers = axum::http::HeaderMap::new();
            if url.contains("/data/stored") {
                headers.insert(
                    axum::http::header::LINK,
                    axum::http::HeaderValue::from_static(r#"<https://x/next>; rel="next""#),
                );
            }
            let path = url.trim_start_matches(BASE).to_string();
            let body = match kind {
                BodyKind::Json => Payload::Json(json!({ "path": path })),
                BodyKind::Text => Payload::Text("Timestamp,v\n".into()),
            };
            Ok(UpstreamResponse {
                status: 200,
                headers,
                body,
            })
        }
    }

    fn make_state() -> (Arc<AppState>, Arc<EchoInvoker>) {
        let invoker = Arc::new(EchoInvoker::default());
        let series = TimeSeriesProxy::new(
            RequestBuilder::new(BASE).unwrap(),
            Arc::new(FixedToken),
            invoker.clone(),
        );
        let mut config = Config::default();
        config.upstream.tenant_id = "t1".into();
        (AppState::new(Arc::new(config), series), invoker)
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (state, _) = make_state();
        let resp = get(make_router(state), "/healthz").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["tenant"], "t1");
    }

    #[tokio::test]
    async fn test_stored_route() {
        let (state, _) = make_state();
        let resp = get(
            make_router(state),
            "/v1/namespaces/ns1/dataviews/dv1/stored?startIndex=0&endIndex=10",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["nextPage"], "https://x/next");
        assert!(json["firstPage"].is_null());
        assert!(
            json["data"]["path"]
                .as_str()
                .unwrap()
                .starts_with("/ns1/dataviews/dv1_narrow/data/stored?startIndex=0&endIndex=10")
        );
    }

    #[tokio::test]
    async fn test_stored_route_follows_next_page() {
        let (state, invoker) = make_state();
        let resp = get(
            make_router(state),
            "/v1/namespaces/ns1/dataviews/dv1/stored?nextPage=https%3A%2F%2Fx%2Fpage2%3Fc%3D1",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(invoker.urls.lock().unwrap()[0], "https://x/page2?c=1");
    }

    #[tokio::test]
    async fn test_interpolated_route_returns_csv_text() {
        let (state, _) = make_state();
        let resp = get(
            make_router(state),
            "/v1/namespaces/ns1/dataviews/dv1/interpolated?startIndex=0&endIndex=10&interpolation=00:05:00",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"], "Timestamp,v\n");
    }

    #[tokio::test]
    async fn test_stream_routes() {
        let (state, invoker) = make_state();
        let app = make_router(state);
        for uri in [
            "/v1/namespaces/ns1/streams?skip=10&query=name:*FV31*",
            "/v1/namespaces/ns1/streams/s1",
            "/v1/namespaces/ns1/streams/s1/data?startIndex=a&endIndex=b",
            "/v1/namespaces/ns1/streams/s1/data/first",
            "/v1/namespaces/ns1/streams/s1/data/last",
            "/v1/namespaces/ns1/dataviews/dv1/resolved/Asset_value",
        ] {
            let resp = get(app.clone(), uri).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        }
        let urls: Vec<String> = invoker
            .urls
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.trim_start_matches(BASE).to_string())
            .collect();
        assert_eq!(
            urls,
            vec![
                "/ns1/Streams?skip=10&count=1000&query=name%3A*FV31*",
                "/ns1/Streams/s1",
                "/ns1/Streams/s1/Data?startIndex=a&endIndex=b",
                "/ns1/Streams/s1/Data/First",
                "/ns1/Streams/s1/Data/Last",
                "/ns1/dataviews/dv1/Resolved/DataItems/Asset_value?count=1000&cache=refresh",
            ]
        );
    }

    #[tokio::test]
    async fn test_upstream_404_passes_through() {
        let (state, _) = make_state();
        let resp = get(make_router(state), "/v1/namespaces/ns1/streams/missing").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["upstream"]["message"], "not found");
        assert_eq!(json["error"]["upstream"]["operationId"], "op-1");
    }

    #[tokio::test]
    async fn test_blank_dataview_id_is_bad_request() {
        let (state, invoker) = make_state();
        let resp = get(
            make_router(state),
            "/v1/namespaces/ns1/dataviews/%20/stored?startIndex=0&endIndex=1",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "missing_identifier");
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interpolated_without_interval_is_bad_request() {
        let (state, invoker) = make_state();
        let resp = get(
            make_router(state),
            "/v1/namespaces/ns1/dataviews/dv1/interpolated?startIndex=0&endIndex=10",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "invalid_argument");
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_batch_isolates_failures() {
        let (state, invoker) = make_state();
        let body = json!({
            "fields": [
                {"field": "stored", "id": "dv1", "namespace": "ns1", "startIndex": "0", "endIndex": "10"},
                {"field": "stored", "namespace": "ns1", "startIndex": "0", "endIndex": "10"},
                {"field": "streamLast", "namespace": "ns1", "streamId": "missing"},
                {"field": "streamFirst", "streamId": "s1"},
                {"field": "nonsense"},
                {"field": "streams", "namespace": "ns1"}
            ]
        });
        let resp = make_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/resolve")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 6);

        assert_eq!(results[0]["nextPage"], "https://x/next");
        assert_eq!(results[1]["error"]["code"], "missing_identifier");
        assert_eq!(results[2]["error"]["upstream"]["status"], 404);
        assert_eq!(results[3]["error"]["code"], "missing_namespace");
        assert_eq!(results[4]["error"]["code"], "invalid_field");
        assert_eq!(results[5]["path"], "/ns1/Streams?count=1000");

        // Only the three well-formed fields with parents reach upstream.
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_resolve_rejects_malformed_body() {
        let (state, _) = make_state();
        let resp = make_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/resolve")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"nope": 1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_from_config_rejects_bad_base() {
        let mut config = Config::default();
        config.upstream.resource_url = "not a url".into();
        let err = AppState::from_config(config).err().unwrap();
        assert!(matches!(err, HubError::Config(_)));
    }
}
