//! File-backed snapshot storage for miniplan.
//!
//! Each bucket is one pretty-printed JSON document at `<dir>/<key>.json`.
//! Writes go through a temporary file in the same directory followed by a
//! rename, so readers only ever see a complete snapshot.

mod error;

pub use error::StoreError;

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Storage of whole-collection snapshots under a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open (creating if needed) the data directory at `dir`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        debug!(dir = %dir.display(), "Opened JSON store");
        Ok(Self { dir })
    }

    /// Data directory of this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Read the snapshot stored under `key`, or `None` if it was never written.
    ///
    /// # Errors
    /// Returns an error if the key is invalid, the file cannot be read, or it
    /// does not contain valid JSON.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!(%key, path = %path.display(), "Loaded snapshot");
        Ok(Some(value))
    }

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the key is invalid or the snapshot cannot be written.
    pub fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let body = serde_json::to_vec_pretty(value).map_err(StoreError::Serialize)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|err| StoreError::Persist {
            path: path.clone(),
            source: err.error,
        })?;

        info!(%key, bytes = body.len(), "Stored snapshot");
        Ok(())
    }
}
