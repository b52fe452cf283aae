//! Typed access through `CacheBackend`.

use std::sync::Arc;
use std::time::Duration;

use cachet_backend::{Backend, BackendError, CacheBackend, ClearScope, MemoryBackend};
use cachet_core::CacheKey;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserInfo {
    id: u64,
    nickname: String,
}

#[tokio::test]
async fn typed_round_trip() {
    let backend = MemoryBackend::new();
    let key = CacheKey::explicit("user:1");
    let user = UserInfo {
        id: 1,
        nickname: "admin".into(),
    };

    backend
        .set_typed(&key, &user, Duration::from_secs(60))
        .await
        .unwrap();
    let cached: Option<UserInfo> = backend.get_typed(&key).await.unwrap();
    assert_eq!(cached, Some(user));
}

#[tokio::test]
async fn payload_of_wrong_shape_is_a_format_error() {
    let backend = MemoryBackend::new();
    let key = CacheKey::explicit("user:1");
    backend
        .set(&key, serde_json::json!("not a user"), Duration::from_secs(60))
        .await
        .unwrap();

    let result = backend.get_typed::<UserInfo>(&key).await;
    assert!(matches!(result, Err(BackendError::Format(_))));
}

#[tokio::test]
async fn shared_store_through_trait_object() {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let key = CacheKey::explicit("GET|/api/v1/template/list");
    backend
        .set(&key, serde_json::json!([1, 2]), Duration::from_secs(60))
        .await
        .unwrap();

    let stats = backend.stats().await.unwrap();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.keys, vec!["GET|/api/v1/template/list".to_owned()]);

    let removed = backend
        .clear(ClearScope::KeyContains("/api/v1/template".into()))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(backend.name(), "memory");
}
