//! Directory store
//!
//! Owns the on-disk name→phone-numbers mapping. Every operation is a full
//! read-modify-write: load the whole record, mutate in memory, write the
//! whole record back, all under one exclusive critical section per store
//! instance so concurrent mutations serialize completely. The write lands
//! in a sibling temp file that is renamed over the store path, so a partial
//! mutation is never visible.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::Error;

/// The in-memory shape of the persisted record.
pub type Directory = HashMap<String, Vec<String>>;

/// File-backed directory store with atomic get/put/delete-by-name
/// semantics.
pub struct DirectoryStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles across connections
    lock: Mutex<()>,
}

impl DirectoryStore {
    /// Create a store over `path`. The file does not have to exist; an
    /// absent or empty file reads as an empty directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the phone numbers stored for a name.
    pub async fn lookup(&self, name: &str) -> Result<Option<Vec<String>>, Error> {
        let _guard = self.lock.lock().await;
        let directory = self.load().await?;
        Ok(directory.get(name).cloned())
    }

    /// Remove a name. Returns `false` and leaves the store untouched when
    /// the name is absent.
    pub async fn remove(&self, name: &str) -> Result<bool, Error> {
        let _guard = self.lock.lock().await;
        let mut directory = self.load().await?;
        if directory.remove(name).is_none() {
            return Ok(false);
        }
        self.persist(&directory).await?;
        debug!(name, "removed directory entry");
        Ok(true)
    }

    /// Store phone numbers for a name. An absent name is created with
    /// exactly `phones`; a present name has `phones` appended to its
    /// existing list, preserving prior entries.
    pub async fn upsert(&self, name: &str, phones: Vec<String>) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut directory = self.load().await?;
        directory.entry(name.to_owned()).or_default().extend(phones);
        self.persist(&directory).await?;
        debug!(name, "upserted directory entry");
        Ok(())
    }

    /// Read the whole record. Callers must hold `lock`.
    async fn load(&self) -> Result<Directory, Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Directory::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if bytes.is_empty() {
            return Ok(Directory::new());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Storage(format!("cannot parse {}: {e}", self.path.display())))
    }

    /// Write the whole record back via temp file + rename. Callers must
    /// hold `lock`.
    async fn persist(&self, directory: &Directory) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(directory)
            .map_err(|e| Error::Storage(format!("cannot serialize directory: {e}")))?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| Error::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Storage(format!("cannot replace {}: {e}", self.path.display())))
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "directory".to_string());
        self.path.with_file_name(format!("{file_name}.tmp"))
    }
}
