//! `GET /files/{name}`

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::Response;

use super::require_read_method;
use super::router::RequestContext;
use crate::config::AppState;
use crate::error::ApiError;
use crate::http;
use crate::storage::{FileName, StorageError};

const INVALID_FILENAME: &str = "Invalid filename";

pub async fn handle_download(
    parts: &Parts,
    raw_name: &str,
    state: &AppState,
) -> Response<Full<Bytes>> {
    download(parts, raw_name, state)
        .await
        .unwrap_or_else(ApiError::into_response)
}

async fn download(
    parts: &Parts,
    raw_name: &str,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ApiError> {
    require_read_method(&parts.method)?;

    let name = decode_name(raw_name)?;
    let file = state.storage.locate(&name).await.map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::not_found("File not found"),
        StorageError::IsDirectory(_) => {
            ApiError::not_found("Requested resource is a directory, not a file")
        }
        StorageError::InvalidName(_) | StorageError::OutsideRoot(_) => {
            ApiError::bad_request(INVALID_FILENAME)
        }
        other => {
            tracing::error!(file = %name, error = %other, "Failed to stat stored file");
            ApiError::internal("Error accessing file")
        }
    })?;

    let data = file.read().await.map_err(|e| {
        tracing::error!(file = %name, error = %e, "Failed to read stored file");
        ApiError::internal("Error accessing file")
    })?;

    let ctx = RequestContext::from_parts(parts);
    Ok(http::send_file(&ctx, &file.path, data, file.modified))
}

/// Percent-decode the path segment and validate it as a stored file name
fn decode_name(raw: &str) -> Result<FileName, ApiError> {
    let decoded = urlencoding::decode(raw).map_err(|_| ApiError::bad_request(INVALID_FILENAME))?;
    FileName::parse(&decoded).map_err(|e| {
        tracing::warn!("Rejected download name: {e}");
        ApiError::bad_request(INVALID_FILENAME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name("a.txt").unwrap().as_str(), "a.txt");
        assert_eq!(
            decode_name("my%20report.pdf").unwrap().as_str(),
            "my report.pdf"
        );
        assert!(decode_name("").is_err());
        assert!(decode_name("..").is_err());
        assert!(decode_name("%2e%2e%2fsecret").is_err());
        assert!(decode_name("sub%2Ffile").is_err());
        assert!(decode_name("%FF").is_err());
    }
}
