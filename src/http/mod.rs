//! HTTP protocol layer module
//!
//! Response builders and the file-sending primitive (conditional requests,
//! byte ranges, content types) shared by the handlers.

pub mod conditional;
pub mod file;
pub mod range;
pub mod response;

pub use file::send_file;
pub use response::{build_404_response, build_405_response, build_redirect_response};
