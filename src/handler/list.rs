//! `GET /files`

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Response, StatusCode};

use super::require_read_method;
use crate::config::AppState;
use crate::error::ApiError;
use crate::http::response::build_json_response;

pub async fn handle_list(parts: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    list(parts, state)
        .await
        .unwrap_or_else(ApiError::into_response)
}

async fn list(parts: &Parts, state: &AppState) -> Result<Response<Full<Bytes>>, ApiError> {
    require_read_method(&parts.method)?;

    let names = state.storage.list().await.map_err(|e| {
        tracing::error!(
            root = %state.storage.root().display(),
            error = %e,
            "Failed to read storage root"
        );
        ApiError::internal("Failed to read directory")
    })?;

    let body = serde_json::to_vec(&names).map_err(|e| {
        tracing::error!("Failed to encode file listing: {e}");
        ApiError::internal("Error generating JSON response")
    })?;

    Ok(build_json_response(StatusCode::OK, Bytes::from(body)))
}
