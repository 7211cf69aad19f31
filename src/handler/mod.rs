//! Request handler module
//!
//! The router dispatches by path to the upload, list and download handlers,
//! everything else falls through to the public directory.

pub mod download;
pub mod list;
pub mod router;
pub mod static_files;
pub mod upload;

use hyper::Method;

use crate::error::ApiError;

// Re-export main entry point
pub use router::handle_request;

/// Downloads and listings answer GET and HEAD only
fn require_read_method(method: &Method) -> Result<(), ApiError> {
    match *method {
        Method::GET | Method::HEAD => Ok(()),
        _ => Err(ApiError::MethodNotAllowed {
            message: "Only GET method is allowed",
            allow: "GET, HEAD",
        }),
    }
}
