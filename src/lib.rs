//! filebox: a small HTTP file storage server.
//!
//! Uploads arrive as multipart forms on `POST /upload`, are stored flat in
//! the storage root and are served back from `/files/{name}`. Every other
//! route is answered from the public directory.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod storage;
