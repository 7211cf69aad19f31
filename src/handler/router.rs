//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body size check, route matching
//! and dispatch to the handlers.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, CONTENT_LENGTH, IF_MODIFIED_SINCE, RANGE};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Response};

use super::{download, list, static_files, upload};
use crate::config::AppState;
use crate::error::ApiError;

/// Request context encapsulating information needed for file responses
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        let header = |name: HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path: parts.uri.path(),
            is_head: parts.method == Method::HEAD,
            if_modified_since: header(IF_MODIFIED_SINCE),
            range_header: header(RANGE),
        }
    }
}

/// Route selected for a request path
#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Upload,
    List,
    /// Raw (still percent-encoded) name after `/files/`
    Download(&'a str),
    Static,
}

impl<'a> Route<'a> {
    pub fn resolve(path: &'a str) -> Self {
        match path {
            "/upload" => Self::Upload,
            "/files" => Self::List,
            _ => path
                .strip_prefix("/files/")
                .map_or(Self::Static, Self::Download),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(max_body_size) = state.config.http.max_body_size {
        if let Err(e) = check_body_size(req.headers(), max_body_size) {
            return Ok(e.into_response());
        }
    }

    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();

    let response = match Route::resolve(&path) {
        Route::Upload => upload::handle_upload(&parts, body, &state).await,
        Route::List => list::handle_list(&parts, &state).await,
        Route::Download(name) => download::handle_download(&parts, name, &state).await,
        Route::Static => static_files::serve_public(&parts, &state).await,
    };

    Ok(response)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Result<(), ApiError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(());
    };
    match value.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) if size > max_body_size => {
            tracing::warn!("Request body too large: {size} bytes (max: {max_body_size})");
            Err(ApiError::PayloadTooLarge(format!(
                "Request body exceeds the {max_body_size} byte limit"
            )))
        }
        Some(_) => Ok(()),
        None => {
            tracing::debug!("Invalid Content-Length value, skipping size check");
            Ok(())
        }
    }
}
