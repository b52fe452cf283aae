//! Response model and envelope unwrapping.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Body fields searched, in order, for an error message.
const MESSAGE_FIELDS: [&str; 3] = ["error", "msg", "message"];

const FALLBACK_MESSAGE: &str = "request failed";

/// A response as returned by the transport.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
}

impl ApiResponse {
    /// Response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Response whose body is `body` serialized as JSON.
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Returns `true` for a 401, the status that drives session recovery.
    pub fn is_auth_failure(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Validates the envelope and returns its `data`.
    ///
    /// A 401 is [`ApiError::Unauthenticated`], any other non-2xx status or an
    /// envelope `code` other than `success_code` is
    /// [`ApiError::Application`]. An empty 2xx body yields `null`.
    pub fn into_data(self, success_code: i64) -> Result<Value, ApiError> {
        if self.is_auth_failure() {
            return Err(ApiError::Unauthenticated);
        }

        if !self.status.is_success() {
            let body = serde_json::from_slice::<Value>(&self.body).ok();
            return Err(ApiError::Application {
                status: self.status,
                code: body.as_ref().and_then(|body| body.get("code")?.as_i64()),
                message: body
                    .as_ref()
                    .and_then(error_message)
                    .unwrap_or_else(|| fallback_message(self.status)),
            });
        }

        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        let body: Value = serde_json::from_slice(&self.body)
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))?;
        let envelope = Envelope::<Value>::deserialize(&body)
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))?;

        if envelope.code != success_code {
            let message = if envelope.message.is_empty() {
                error_message(&body).unwrap_or_else(|| fallback_message(self.status))
            } else {
                envelope.message
            };
            return Err(ApiError::Application {
                status: self.status,
                code: Some(envelope.code),
                message,
            });
        }

        Ok(envelope.data)
    }
}

/// The backend's response wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T = Value> {
    /// Application status code.
    pub code: i64,
    /// Payload.
    #[serde(default)]
    pub data: T,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

fn error_message(body: &Value) -> Option<String> {
    MESSAGE_FIELDS.iter().find_map(|field| {
        body.get(field)
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    })
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or(FALLBACK_MESSAGE)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_data() {
        let response = ApiResponse::json(
            StatusCode::OK,
            &json!({"code": 200, "data": {"id": 1}, "message": "ok"}),
        );
        assert_eq!(response.into_data(200).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let response = ApiResponse::json(StatusCode::OK, &json!({"code": 0}));
        assert_eq!(response.into_data(0).unwrap(), Value::Null);
    }

    #[test]
    fn failing_code_is_an_application_error() {
        let response = ApiResponse::json(
            StatusCode::OK,
            &json!({"code": 4001, "data": null, "message": "folder exists"}),
        );
        match response.into_data(200) {
            Err(ApiError::Application { code, message, .. }) => {
                assert_eq!(code, Some(4001));
                assert_eq!(message, "folder exists");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_status_message_prefers_error_then_msg_then_message() {
        let response = ApiResponse::json(
            StatusCode::BAD_REQUEST,
            &json!({"msg": "second", "message": "third"}),
        );
        let error = response.into_data(200).unwrap_err();
        assert_eq!(error.to_string(), "second");

        let response = ApiResponse::json(
            StatusCode::BAD_REQUEST,
            &json!({"error": "first", "msg": "second"}),
        );
        assert_eq!(response.into_data(200).unwrap_err().to_string(), "first");
    }

    #[test]
    fn error_status_without_body_falls_back_to_reason() {
        let response = ApiResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "<html>");
        let error = response.into_data(200).unwrap_err();
        assert_eq!(error.to_string(), "Internal Server Error");
        assert_eq!(error.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn unauthorized_is_unauthenticated() {
        let response = ApiResponse::new(StatusCode::UNAUTHORIZED, "");
        assert!(response.into_data(200).unwrap_err().is_unauthenticated());
    }

    #[test]
    fn non_envelope_body_is_invalid() {
        let response = ApiResponse::json(StatusCode::OK, &json!([1, 2, 3]));
        assert!(matches!(
            response.into_data(200),
            Err(ApiError::InvalidResponse(_))
        ));

        let response = ApiResponse::new(StatusCode::OK, "not json");
        assert!(matches!(
            response.into_data(200),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_success_body_is_null() {
        let response = ApiResponse::new(StatusCode::NO_CONTENT, "");
        assert_eq!(response.into_data(200).unwrap(), Value::Null);
    }
}
