//! Storage root management
//!
//! All uploaded files live as direct children of a single root directory.
//! Names are validated by [`FileName`] and every resolved path is checked
//! against the canonical root so symlinks cannot point requests elsewhere.
//!
//! Uploads are written into a staging directory inside the root and renamed
//! onto their final name only once complete, so a failed upload never
//! touches a file already stored under the same name.

mod filename;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub use filename::FileName;

/// Errors raised by storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid filename: {0}")]
    InvalidName(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("not a regular file: {0}")]
    IsDirectory(String),

    #[error("path escapes storage root: {0}")]
    OutsideRoot(String),

    #[error("storage root '{}' is unusable: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Metadata of a stored file resolved by [`Storage::locate`]
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl StoredFile {
    pub async fn read(&self) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(&self.path).await?)
    }
}

/// Directory under the root holding uploads still being written.
/// Directories never show up in listings.
const STAGING_DIR: &str = ".partial";

/// Distinguishes concurrent staged uploads of the same name
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle to the storage root
#[derive(Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Make sure `root` exists as a directory, creating it with mode 0755.
    ///
    /// Idempotent. Fails if the path exists but is not a directory or cannot
    /// be created.
    pub fn ensure(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        let root_err = |source: io::Error| StorageError::Root {
            path: root.to_path_buf(),
            source,
        };

        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(path = %root.display(), "Reusing storage root");
            }
            Ok(_) => {
                return Err(root_err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                create_root(root).map_err(root_err)?;
                tracing::info!(path = %root.display(), "Created storage root");
            }
            Err(e) => return Err(root_err(e)),
        }

        let root = root.canonicalize().map_err(root_err)?;
        prepare_staging(&root.join(STAGING_DIR)).map_err(root_err)?;
        Ok(Self { root })
    }

    /// Canonical path of the storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stat a stored file
    pub async fn locate(&self, name: &FileName) -> Result<StoredFile, StorageError> {
        let path = self.root.join(name.as_str());
        self.check_contained(&path, name).await?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if meta.is_dir() {
            return Err(StorageError::IsDirectory(name.to_string()));
        }

        Ok(StoredFile {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    /// Names of all non-directory entries under the root, sorted
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // file_type does not follow symlinks
            if entry.file_type().await?.is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        names.sort();
        Ok(names)
    }

    /// Start writing a stored file.
    ///
    /// Bytes go to a staging file; the existing content under `name`, if
    /// any, is replaced only by [`FileWriter::finish`].
    pub async fn create(&self, name: &FileName) -> Result<FileWriter, StorageError> {
        let target = self.root.join(name.as_str());
        self.check_contained(&target, name).await?;

        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .root
            .join(STAGING_DIR)
            .join(format!("{}.{}.{seq}", name.as_str(), std::process::id()));

        let file = fs::File::create(&staging).await?;
        Ok(FileWriter {
            staging,
            target,
            file,
            written: 0,
        })
    }

    /// Reject symlinks that resolve outside the root.
    ///
    /// `path` is always `root/<single component>`, so only a symlink can
    /// escape. Dangling symlinks are rejected as well since writing through
    /// them would create the target.
    async fn check_contained(&self, path: &Path, name: &FileName) -> Result<(), StorageError> {
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if !meta.file_type().is_symlink() {
            return Ok(());
        }

        match fs::canonicalize(path).await {
            Ok(resolved) if resolved.starts_with(&self.root) => Ok(()),
            Ok(resolved) => {
                tracing::warn!(
                    name = %name,
                    target = %resolved.display(),
                    "Blocked symlink escaping storage root"
                );
                Err(StorageError::OutsideRoot(name.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::OutsideRoot(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Writer for a file being stored. The handle closes on drop.
#[derive(Debug)]
pub struct FileWriter {
    staging: PathBuf,
    target: PathBuf,
    file: fs::File,
    written: u64,
}

impl FileWriter {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush the staged data and move it onto the target name.
    ///
    /// Returns the number of bytes stored. On failure the staging file is
    /// removed and the target is left as it was.
    pub async fn finish(mut self) -> Result<u64, StorageError> {
        let flushed = self.file.flush().await;
        let Self {
            staging,
            target,
            file,
            written,
        } = self;
        drop(file);

        let result = match flushed {
            Ok(()) => fs::rename(&staging, &target).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Ok(written),
            Err(e) => {
                remove_staging(&staging).await;
                Err(e.into())
            }
        }
    }

    /// Drop the handle and discard the staged bytes
    pub async fn abort(self) {
        let Self { staging, file, .. } = self;
        drop(file);
        remove_staging(&staging).await;
    }
}

async fn remove_staging(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove partial upload"
        );
    }
}

/// Create the staging directory, clearing uploads left by a previous run
fn prepare_staging(dir: &Path) -> io::Result<()> {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                let path = entry?.path();
                tracing::debug!(path = %path.display(), "Removing stale partial upload");
                std::fs::remove_file(path)?;
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => create_root(dir),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_root(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(path)
}

#[cfg(not(unix))]
fn create_root(path: &Path) -> io::Result<()> {
    std::fs::DirBuilder::new().recursive(true).create(path)
}
