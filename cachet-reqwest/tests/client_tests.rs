//! CachingClient and SessionGuard over HTTP.

use cachet::session::{Credentials, EndpointRefresher};
use cachet::{CacheStatus, CachingClient, ClientConfig, Pipeline, RequestConfig, SessionGuard};
use cachet_backend::MemoryBackend;
use cachet_reqwest::ReqwestTransport;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, Deserialize)]
struct UserInfo {
    id: u64,
    nickname: String,
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": data, "message": "ok"}))
}

/// Test 1: configured policy caches a read, mutation purges it
#[tokio::test]
async fn test_config_driven_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("path", "/a"))
        .respond_with(envelope(json!(["x"])))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/mkdir"))
        .respond_with(envelope(json!(null)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let yaml = r#"
policies:
  - path: /files
    ttl: 3m
invalidation:
  - trigger: /files
    purge: [/files]
"#;
    let config: ClientConfig = serde_saphyr::from_str(yaml).unwrap();
    let backend = MemoryBackend::new();
    let client = CachingClient::builder(Pipeline::new(ReqwestTransport::new(mock_server.uri())))
        .backend(backend.clone())
        .config(&config)
        .build();

    let listing = || RequestConfig::new().params(json!({"path": "/a"}));
    let (_, first) = client
        .get_with_status::<Vec<String>>("/files", listing())
        .await
        .unwrap();
    let (_, second) = client
        .get_with_status::<Vec<String>>("/files", listing())
        .await
        .unwrap();
    assert_eq!(first.status, CacheStatus::Miss);
    assert_eq!(second.status, CacheStatus::Hit);
    assert_eq!(backend.len(), 1);

    client
        .post::<serde_json::Value>("/files/mkdir", RequestConfig::new().data(json!({"name": "b"})))
        .await
        .unwrap();
    assert!(backend.is_empty());

    let (_, third) = client
        .get_with_status::<Vec<String>>("/files", listing())
        .await
        .unwrap();
    assert_eq!(third.status, CacheStatus::Miss);
}

/// Test 2: two concurrent getUserInfo calls with an expired token share one
/// refresh request on the wire
#[tokio::test]
async fn test_user_info_single_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/coulduser/userinfo"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/coulduser/userinfo"))
        .and(header("authorization", "Bearer t2"))
        .and(header("accept-language", "zh-CN"))
        .respond_with(envelope(json!({"id": 1, "nickname": "admin"})))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({"session_uuid": "s1"})))
        .respond_with(envelope(json!({"access_token": "t2", "session_uuid": "s2"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::default();
    let transport = ReqwestTransport::new(mock_server.uri());
    let refresher = EndpointRefresher::new(
        Pipeline::new(transport.clone()),
        config.session.refresh_path.as_str(),
    );
    let guard = SessionGuard::builder(config.session.clone())
        .refresher(refresher)
        .build()
        .unwrap();
    guard
        .login(Credentials::new("t1").with_session_id("s1"))
        .await;

    let client = CachingClient::builder(Pipeline::builder(transport).with(guard.clone()).build())
        .config(&config)
        .build();

    let (a, b) = tokio::join!(
        client.get::<UserInfo>("/api/v1/coulduser/userinfo", RequestConfig::new()),
        client.get::<UserInfo>("/api/v1/coulduser/userinfo", RequestConfig::new()),
    );
    let expected = UserInfo {
        id: 1,
        nickname: "admin".into(),
    };
    assert_eq!(a.unwrap(), expected);
    assert_eq!(b.unwrap(), expected);
    assert_eq!(guard.access_token().await.as_deref(), Some("t2"));
    assert_eq!(guard.session_id().await.as_deref(), Some("s2"));

    let (_, ctx) = client
        .get_with_status::<UserInfo>("/api/v1/coulduser/userinfo", RequestConfig::new())
        .await
        .unwrap();
    assert_eq!(ctx.status, CacheStatus::Hit);
}
