//! ReqwestTransport against a wiremock server.

use std::time::Duration;

use cachet::{ApiRequest, Pipeline, Transport, TransportError};
use cachet_reqwest::ReqwestTransport;
use http::{HeaderValue, Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test 1: params are sent as query pairs, arrays repeated
#[tokio::test]
async fn test_query_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/couldfile/list"))
        .and(query_param("path", "/a"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(mock_server.uri());
    let request = ApiRequest::new(Method::GET, "/api/v1/couldfile/list").with_params(json!({
        "path": "/a",
        "page": 1,
        "tags": ["x", "y"],
        "cursor": null,
    }));
    let response = transport.execute(request).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let received = mock_server.received_requests().await.unwrap();
    let tags: Vec<String> = received[0]
        .url
        .query_pairs()
        .filter(|(name, _)| name == "tags")
        .map(|(_, value)| value.into_owned())
        .collect();
    assert_eq!(tags, vec!["x".to_owned(), "y".to_owned()]);
    assert!(!received[0].url.query_pairs().any(|(name, _)| name == "cursor"));
}

/// Test 2: data is sent as a JSON body, headers pass through
#[tokio::test]
async fn test_json_body_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/couldfile/mkdir"))
        .and(header("content-type", "application/json"))
        .and(header("x-tenant", "acme"))
        .and(body_json(json!({"path": "/a", "name": "b"})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-request-id", "42")
                .set_body_json(json!({"code": 200, "data": {"created": true}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(format!("{}/", mock_server.uri()));
    let mut request = ApiRequest::new(Method::POST, "api/v1/couldfile/mkdir")
        .with_data(json!({"path": "/a", "name": "b"}));
    request
        .headers
        .insert("x-tenant", HeaderValue::from_static("acme"));

    let response = Pipeline::new(transport).send(request).await.unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.headers["x-request-id"], "42");
    assert_eq!(
        response.into_data(200).unwrap(),
        json!({"created": true})
    );
}

/// Test 3: per-call timeout maps to TransportError::Timeout
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(mock_server.uri());
    let mut request = ApiRequest::new(Method::GET, "/slow");
    request.timeout = Some(Duration::from_millis(50));

    let error = transport.execute(request).await.unwrap_err();
    assert!(matches!(error, TransportError::Timeout), "got {error:?}");
}

/// Test 4: unreachable server maps to TransportError::Connection
#[tokio::test]
async fn test_connection_refused() {
    let transport = ReqwestTransport::new("http://127.0.0.1:1");
    let error = transport
        .execute(ApiRequest::new(Method::GET, "/"))
        .await
        .unwrap_err();
    assert!(matches!(error, TransportError::Connection(_)), "got {error:?}");
}

/// Test 5: error statuses are responses, not transport errors
#[tokio::test]
async fn test_error_status_is_a_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/template/7"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"msg": "no such template"})))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(mock_server.uri());
    let response = transport
        .execute(ApiRequest::new(Method::DELETE, "/api/v1/template/7"))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.into_data(200).unwrap_err().to_string(),
        "no such template"
    );
}
