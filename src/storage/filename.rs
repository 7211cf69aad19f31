//! Stored file names
//!
//! A `FileName` is a single path component that can be joined onto the
//! storage root without leaving it.

use std::fmt;

use super::StorageError;

/// Validated name of a file directly under the storage root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Validate a client-supplied name.
    ///
    /// Rejects empty names, any `..` substring, path separators of either
    /// platform, NUL bytes and the bare `.` component.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidName("empty filename".to_string()));
        }
        if raw.contains("..") {
            return Err(StorageError::InvalidName(format!(
                "filename contains '..': {raw}"
            )));
        }
        if raw == "." || raw.contains(['/', '\\', '\0']) {
            return Err(StorageError::InvalidName(format!(
                "filename is not a single path component: {raw}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
