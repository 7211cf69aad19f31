//! `POST /upload`
//!
//! Streams the first multipart field named `file` into the storage root.

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use multer::{Constraints, Multipart, SizeLimit};

use crate::config::AppState;
use crate::error::ApiError;
use crate::http::response::build_text_response;
use crate::storage::{FileName, FileWriter, StorageError};

const FILE_FIELD: &str = "file";

const PARSE_FORM_ERROR: &str = "Error parsing upload form";
const MISSING_FILE_ERROR: &str = "Error retrieving the file";
const SAVE_ERROR: &str = "Failed to save file";
const INVALID_FILENAME: &str = "Invalid filename";

pub async fn handle_upload<B>(parts: &Parts, body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match upload(parts, body, state).await {
        Ok((name, bytes)) => {
            tracing::info!(file = %name, bytes, "Stored upload");
            build_text_response(
                StatusCode::OK,
                format!("File uploaded successfully: {name}"),
            )
        }
        Err(e) => e.into_response(),
    }
}

async fn upload<B>(parts: &Parts, body: B, state: &AppState) -> Result<(FileName, u64), ApiError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if parts.method != Method::POST {
        return Err(ApiError::MethodNotAllowed {
            message: "Only POST method is allowed",
            allow: "POST",
        });
    }

    let boundary = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| ApiError::bad_request(PARSE_FORM_ERROR))?;

    // Uploads stream to disk, so size is only bounded when a cap is configured
    let limit = state.config.http.max_body_size;
    let mut multipart = match limit {
        Some(limit) => {
            let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
            Multipart::with_constraints(body.into_data_stream(), boundary, constraints)
        }
        None => Multipart::new(body.into_data_stream(), boundary),
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(&e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // `filename=""` is a form with no file chosen
        let Some(raw_name) = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(ToString::to_string)
        else {
            return Err(ApiError::bad_request(MISSING_FILE_ERROR));
        };
        let name = FileName::parse(&raw_name).map_err(|e| {
            tracing::warn!("Rejected upload name: {e}");
            ApiError::bad_request(INVALID_FILENAME)
        })?;

        let mut writer = state
            .storage
            .create(&name)
            .await
            .map_err(|e| save_error(&name, &e))?;

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    writer.abort().await;
                    return Err(form_error(&e, limit));
                }
            };
            if let Err(e) = writer.write_chunk(&chunk).await {
                return Err(abort_with(writer, &name, &e).await);
            }
        }

        return match writer.finish().await {
            Ok(bytes) => Ok((name, bytes)),
            Err(e) => Err(save_error(&name, &e)),
        };
    }

    Err(ApiError::bad_request(MISSING_FILE_ERROR))
}

async fn abort_with(writer: FileWriter, name: &FileName, error: &StorageError) -> ApiError {
    writer.abort().await;
    save_error(name, error)
}

fn save_error(name: &FileName, error: &StorageError) -> ApiError {
    match error {
        StorageError::OutsideRoot(_) => ApiError::bad_request(INVALID_FILENAME),
        other => {
            tracing::error!(file = %name, error = %other, "Failed to save upload");
            ApiError::internal(SAVE_ERROR)
        }
    }
}

fn form_error(error: &multer::Error, limit: Option<u64>) -> ApiError {
    match (error, limit) {
        (
            multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. },
            Some(limit),
        ) => ApiError::PayloadTooLarge(format!("Upload exceeds the {limit} byte limit")),
        (other, _) => {
            tracing::debug!("Malformed multipart body: {other}");
            ApiError::bad_request(PARSE_FORM_ERROR)
        }
    }
}
