//! In-process transport driven by a closure.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cachet::{ApiRequest, ApiResponse, Transport, TransportError};
use http::StatusCode;
use http::header::AUTHORIZATION;
use serde_json::{Value, json};

type Handler = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Records every request and answers with `handler` after `latency`.
#[derive(Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

struct Inner {
    handler: Box<Handler>,
    latency: Duration,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self::with_latency(Duration::ZERO, handler)
    }

    pub fn with_latency<F>(latency: Duration, handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                latency,
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Number of requests sent to `path`.
    pub fn count(&self, path: &str) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.inner.calls.lock().unwrap().push(request.clone());
        if !self.inner.latency.is_zero() {
            tokio::time::sleep(self.inner.latency).await;
        }
        (self.inner.handler)(&request)
    }
}

/// Successful envelope around `data`.
pub fn ok(data: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::json(
        StatusCode::OK,
        &json!({"code": 200, "data": data, "message": "ok"}),
    ))
}

/// Bare response with `status` and `body`.
pub fn status(status: StatusCode, body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::json(status, &body))
}

/// Bearer token a request was sent with.
pub fn bearer(request: &ApiRequest) -> Option<String> {
    request
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}
