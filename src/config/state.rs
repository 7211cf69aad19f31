// Application state module
// Shared, read-only state handed to every connection

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::types::Config;
use crate::storage::{Storage, StorageError};

/// Application state
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub public_dir: PathBuf,
    /// Open connections, used for the connection cap and shutdown drain
    pub active_connections: Arc<AtomicUsize>,
}

impl AppState {
    /// Build state, creating the storage root if it is missing
    pub fn new(config: Config) -> Result<Self, StorageError> {
        let storage = Storage::ensure(&config.storage.data_dir)?;
        let public_dir = PathBuf::from(&config.storage.public_dir);

        Ok(Self {
            config,
            storage,
            public_dir,
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }
}
