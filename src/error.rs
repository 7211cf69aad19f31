//! Request-level errors
//!
//! Every failure a handler reports ends up as an HTTP status plus the JSON
//! envelope `{"error": "<message>"}`.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::http::response::build_json_response;

/// Errors returned to the client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    MethodNotAllowed {
        message: &'static str,
        /// Value of the `Allow` header
        allow: &'static str,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error envelope
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let message = self.to_string();
        let body = serde_json::to_vec(&ErrorBody { error: &message })
            .unwrap_or_else(|_| br#"{"error":"Internal server error"}"#.to_vec());

        let mut response = build_json_response(self.status(), Bytes::from(body));
        if let Self::MethodNotAllowed { allow, .. } = self {
            response
                .headers_mut()
                .insert(hyper::header::ALLOW, hyper::header::HeaderValue::from_static(allow));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let response = ApiError::not_found("File not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        assert_eq!(body_string(response).await, r#"{"error":"File not found"}"#);
    }

    #[tokio::test]
    async fn test_method_not_allowed_sets_allow() {
        let response = ApiError::MethodNotAllowed {
            message: "Only POST method is allowed",
            allow: "POST",
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "POST");
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Only POST method is allowed"}"#
        );
    }

    #[tokio::test]
    async fn test_message_is_json_escaped() {
        let response = ApiError::bad_request("bad \"quote\"").into_response();
        assert_eq!(body_string(response).await, r#"{"error":"bad \"quote\""}"#);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::PayloadTooLarge(String::new()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
