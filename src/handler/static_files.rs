//! Static file serving module
//!
//! Serves the public directory for every route the router does not claim:
//! index file resolution, directory listings and trailing-slash redirects.

use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use tokio::fs;

use super::router::RequestContext;
use crate::config::AppState;
use crate::http::{self, response};

/// Serve a request from the public directory
pub async fn serve_public(parts: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    if !matches!(parts.method, Method::GET | Method::HEAD) {
        tracing::debug!("Method not allowed on static route: {}", parts.method);
        return http::build_405_response();
    }

    let ctx = RequestContext::from_parts(parts);
    let Some(relative) = clean_request_path(ctx.path) else {
        return http::build_404_response();
    };

    let public_root = match fs::canonicalize(&state.public_dir).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(
                "Public directory not found or inaccessible '{}': {e}",
                state.public_dir.display()
            );
            return http::build_404_response();
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(resolved) = fs::canonicalize(public_root.join(&relative)).await else {
        return http::build_404_response();
    };
    if !resolved.starts_with(&public_root) {
        tracing::warn!(
            "Path traversal attempt blocked: {} -> {}",
            ctx.path,
            resolved.display()
        );
        return http::build_404_response();
    }

    let Ok(meta) = fs::metadata(&resolved).await else {
        return http::build_404_response();
    };

    // Redirect targets come from the cleaned path, never the raw one, so a
    // path like `//host/..` cannot produce an off-site Location.
    if meta.is_dir() {
        if !ctx.path.ends_with('/') {
            return http::build_redirect_response(&directory_url(&relative));
        }
        for index_file in &state.config.storage.index_files {
            let index_path = resolved.join(index_file);
            if fs::metadata(&index_path).await.is_ok_and(|m| m.is_file()) {
                return send_path(&ctx, &index_path).await;
            }
        }
        return directory_listing(&resolved, ctx.is_head).await;
    }

    if ctx.path.ends_with("/index.html") {
        let parent = relative.parent().unwrap_or_else(|| Path::new(""));
        return http::build_redirect_response(&directory_url(parent));
    }
    if ctx.path.ends_with('/') {
        return http::build_redirect_response(&file_url(&relative));
    }

    send_path(&ctx, &resolved).await
}

async fn send_path(ctx: &RequestContext<'_>, path: &Path) -> Response<Full<Bytes>> {
    let modified = fs::metadata(path).await.ok().and_then(|m| m.modified().ok());
    match fs::read(path).await {
        Ok(data) => http::send_file(ctx, path, data, modified),
        Err(e) => {
            tracing::error!("Failed to read file '{}': {e}", path.display());
            response::build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal Server Error",
            )
        }
    }
}

/// Decode and lexically clean a request path into a relative path.
///
/// `.` segments are dropped and `..` pops a segment without ever going above
/// the root, so the result never starts with `..`.
fn clean_request_path(path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(path).ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    Some(segments.iter().collect())
}

/// Absolute, percent-encoded URL path for a cleaned relative path
fn file_url(relative: &Path) -> String {
    relative
        .iter()
        .fold(String::new(), |mut url, segment| {
            url.push('/');
            url.push_str(&urlencoding::encode(&segment.to_string_lossy()));
            url
        })
}

/// Same as [`file_url`] with a trailing slash; the public root maps to `/`
fn directory_url(relative: &Path) -> String {
    let mut url = file_url(relative);
    url.push('/');
    url
}

/// Render a minimal HTML index of a directory
async fn directory_listing(dir: &Path, is_head: bool) -> Response<Full<Bytes>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Failed to list directory '{}': {e}", dir.display());
            return response::build_text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading directory",
            );
        }
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        names.push((name, is_dir));
    }
    names.sort();

    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for (name, is_dir) in &names {
        let slash = if *is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<a href=\"{}{slash}\">{}{slash}</a>\n",
            urlencoding::encode(name),
            escape_html(name),
        ));
    }
    html.push_str("</pre>\n");

    response::build_html_response(html, is_head)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_request_path() {
        assert_eq!(clean_request_path("/").unwrap(), PathBuf::new());
        assert_eq!(
            clean_request_path("/css/site.css").unwrap(),
            PathBuf::from("css/site.css")
        );
        assert_eq!(
            clean_request_path("/../../etc/passwd").unwrap(),
            PathBuf::from("etc/passwd")
        );
        assert_eq!(
            clean_request_path("/a/./b/../c").unwrap(),
            PathBuf::from("a/c")
        );
        assert_eq!(
            clean_request_path("/%2e%2e/secret").unwrap(),
            PathBuf::from("secret")
        );
        assert!(clean_request_path("/bad%00name").is_none());
    }

    #[test]
    fn test_redirect_urls() {
        assert_eq!(directory_url(Path::new("")), "/");
        assert_eq!(directory_url(Path::new("docs/api")), "/docs/api/");
        assert_eq!(file_url(Path::new("docs/a b.txt")), "/docs/a%20b.txt");
        // a cleaned path never yields a protocol-relative URL
        let relative = clean_request_path("//evil.example/..").unwrap();
        assert_eq!(directory_url(&relative), "/");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }
}
