//! `Transport` over a `reqwest-middleware` client.

use async_trait::async_trait;
use cachet::{ApiRequest, ApiResponse, Transport, TransportError};
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use tracing::{debug, warn};

/// Sends cachet requests with reqwest.
///
/// Request paths are appended to `base_url`. Params become the query
/// string: scalars as text, arrays as repeated keys, nested objects as JSON
/// text. Null params are skipped. `data` is sent as a JSON body.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ReqwestTransport {
    /// Transport with a default reqwest client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(ClientBuilder::new(reqwest::Client::new()).build(), base_url)
    }

    /// Transport over an existing middleware client.
    pub fn with_client(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let base = self.base_url.trim_end_matches('/');
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}")).map_err(TransportError::other)?;

        match &request.params {
            None | Some(Value::Null) => {}
            Some(Value::Object(params)) if params.is_empty() => {}
            Some(Value::Object(params)) => {
                let mut pairs = url.query_pairs_mut();
                for (name, value) in params {
                    match value {
                        Value::Array(items) => {
                            for item in items.iter().filter_map(query_text) {
                                pairs.append_pair(name, &item);
                            }
                        }
                        value => {
                            if let Some(text) = query_text(value) {
                                pairs.append_pair(name, &text);
                            }
                        }
                    }
                }
            }
            Some(other) => {
                warn!(path = %request.path, params = %other, "params are not an object, ignoring");
            }
        }
        Ok(url)
    }
}

fn query_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn map_reqwest(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connection(Box::new(error))
    } else {
        TransportError::Other(Box::new(error))
    }
}

fn map_error(error: reqwest_middleware::Error) -> TransportError {
    match error {
        reqwest_middleware::Error::Reqwest(error) => map_reqwest(error),
        reqwest_middleware::Error::Middleware(error) => TransportError::Other(error.into()),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url(&request)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(data) = &request.data {
            let body = serde_json::to_vec(data).map_err(TransportError::other)?;
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest)?;
        debug!(method = %request.method, path = %request.path, %status, "response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
