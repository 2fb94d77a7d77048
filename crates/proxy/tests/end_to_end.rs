//! Router → credential cache → upstream, wired from configuration and
//! driven against one wiremock server playing both identity and data
//! service.

use axum::{body::Body, http::Request, http::StatusCode};
use hubgate_config::Config;
use hubgate_proxy::{AppState, make_router};
use http_body_util::BodyExt as _;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.upstream.resource_url = server.uri();
    config.upstream.tenant_id = "t1".into();
    config.identity.client_id = "hub-client".into();
    config.identity.client_secret = "hub-secret".into();
    config
}

async fn mount_identity(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/identity/connect/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=hub-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "live-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn stored_page_through_the_whole_stack() {
    let server = MockServer::start().await;
    mount_identity(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/Tenants/t1/Namespaces/ns1/dataviews/dv1_narrow/data/stored",
        ))
        .and(query_param("startIndex", "0"))
        .and(query_param("endIndex", "10"))
        .and(header("authorization", "Bearer live-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", r#"<https://x/next>; rel="next""#)
                .set_body_json(json!({"v": [1, 2, 3]})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let app = make_router(AppState::from_config(config_for(&server)).unwrap());
    let uri = "/v1/namespaces/ns1/dataviews/dv1/stored?startIndex=0&endIndex=10";

    for _ in 0..2 {
        let resp = get(app.clone(), uri).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"], json!({"v": [1, 2, 3]}));
        assert_eq!(json["nextPage"], "https://x/next");
        assert!(json["firstPage"].is_null());
    }
}

#[tokio::test]
async fn upstream_not_found_reaches_client() {
    let server = MockServer::start().await;
    mount_identity(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Tenants/t1/Namespaces/ns1/Streams/nope"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("operation-id", "op-77")
                .set_body_string("not found"),
        )
        .mount(&server)
        .await;

    let app = make_router(AppState::from_config(config_for(&server)).unwrap());
    let resp = get(app, "/v1/namespaces/ns1/streams/nope").await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["error"]["upstream"]["message"], "not found");
    assert_eq!(json["error"]["upstream"]["operationId"], "op-77");
}

#[tokio::test]
async fn identity_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/connect/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let app = make_router(AppState::from_config(config_for(&server)).unwrap());
    let resp = get(app, "/v1/namespaces/ns1/streams/s1/data/last").await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(resp).await;
    assert_eq!(json["error"]["code"], "token_fetch_failed");
}

#[tokio::test]
async fn batch_shares_one_token_exchange() {
    let server = MockServer::start().await;
    mount_identity(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Tenants/t1/Namespaces/ns1/Streams/s1/Data/First"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Value": 1})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Tenants/t1/Namespaces/ns1/Streams/s1/Data/Last"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Value": 9})))
        .mount(&server)
        .await;

    let app = make_router(AppState::from_config(config_for(&server)).unwrap());
    let body = json!({
        "fields": [
            {"field": "streamFirst", "namespace": "ns1", "streamId": "s1"},
            {"field": "streamLast", "namespace": "ns1", "streamId": "s1"},
            {"field": "streamLast", "streamId": "s1"}
        ]
    });
    let resp = app
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
    assert_eq!(json["results"][0], json!({"Value": 1}));
    assert_eq!(json["results"][1], json!({"Value": 9}));
    assert_eq!(json["results"][2]["error"]["code"], "missing_namespace");
}

#[tokio::test]
async fn rejected_token_is_refetched_on_next_request() {
    let server = MockServer::start().await;
    mount_identity(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Tenants/t1/Namespaces/ns1/Streams/s1"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Tenants/t1/Namespaces/ns1/Streams/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": "s1"})))
        .mount(&server)
        .await;

    let app = make_router(AppState::from_config(config_for(&server)).unwrap());

    let resp = get(app.clone(), "/v1/namespaces/ns1/streams/s1").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = get(app, "/v1/namespaces/ns1/streams/s1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"Id": "s1"}));
}
