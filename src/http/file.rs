//! File sending shared by downloads and static assets

use std::path::Path;
use std::time::SystemTime;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use mime_guess::mime;

use super::conditional;
use super::range::ByteRange;
use super::response::{self, FileHeaders};
use crate::handler::router::RequestContext;

/// Content type inferred from the file extension.
///
/// Text types are sent as UTF-8.
pub fn content_type_for(path: &Path) -> String {
    let guessed = mime_guess::from_path(path).first_or_octet_stream();
    let is_text = guessed.type_() == mime::TEXT
        || guessed.subtype() == mime::JAVASCRIPT
        || guessed.subtype() == mime::JSON;
    if is_text && guessed.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guessed.essence_str())
    } else {
        guessed.to_string()
    }
}

/// Send a file's bytes honouring HEAD, `If-Modified-Since` and `Range`
pub fn send_file(
    ctx: &RequestContext<'_>,
    path: &Path,
    data: Vec<u8>,
    modified: Option<SystemTime>,
) -> Response<Full<Bytes>> {
    let last_modified = modified.map(conditional::http_date);

    if conditional::is_not_modified(ctx.if_modified_since.as_deref(), modified) {
        return response::build_304_response(last_modified.as_deref());
    }

    let content_type = content_type_for(path);
    let headers = FileHeaders {
        content_type: &content_type,
        last_modified: last_modified.as_deref(),
    };
    let total_size = data.len();
    let data = Bytes::from(data);

    match ByteRange::resolve(ctx.range_header.as_deref(), total_size) {
        ByteRange::Full => response::build_file_response(data, &headers, ctx.is_head),
        ByteRange::Partial { start, end } => response::build_partial_response(
            data.slice(start..=end),
            &headers,
            start,
            end,
            total_size,
            ctx.is_head,
        ),
        ByteRange::Unsatisfiable => response::build_416_response(total_size),
    }
}
