//! JSON file lock store.
//!
//! Layout: `<root>/<owner>/<repo>.json`, one file per repository key. Writes
//! go to a temporary file in the same directory, are fsynced, then renamed
//! over the old file, so a crash leaves either the old or the new set.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lfsproxy_core::RepositoryKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::LockStoreError;
use crate::store::LockStore;
use crate::types::FileLock;

#[derive(Serialize)]
struct LockFileRef<'a> {
    locks: &'a [FileLock],
}

#[derive(Deserialize)]
struct LockFile {
    locks: Vec<FileLock>,
}

/// [`LockStore`] keeping one JSON document per repository on disk.
#[derive(Debug, Clone)]
pub struct JsonFileLockStore {
    root: PathBuf,
}

impl JsonFileLockStore {
    /// Create a store rooted at `root`. Directories are created on first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the set of `repository`.
    ///
    /// Repository keys are validated to `[A-Za-z0-9_-]` segments, so every
    /// segment maps to a plain directory or file name below the root.
    #[must_use]
    pub fn path_for(&self, repository: &RepositoryKey) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = repository.as_str().split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.json"));
            }
        }
        path
    }
}

#[async_trait]
impl LockStore for JsonFileLockStore {
    fn location(&self, repository: &RepositoryKey) -> String {
        self.path_for(repository).display().to_string()
    }

    async fn load(&self, repository: &RepositoryKey) -> Result<Vec<FileLock>, LockStoreError> {
        let path = self.path_for(repository);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %path.display(), "no lock file yet");
                return Ok(Vec::new());
            }
            Err(source) => return Err(LockStoreError::Io { path, source }),
        };

        let file: LockFile = serde_json::from_slice(&bytes)
            .map_err(|source| LockStoreError::Corrupt { path: path.clone(), source })?;
        trace!(path = %path.display(), count = file.locks.len(), "loaded lock file");
        Ok(file.locks)
    }

    async fn save(
        &self,
        repository: &RepositoryKey,
        locks: &[FileLock],
    ) -> Result<(), LockStoreError> {
        let bytes = serde_json::to_vec_pretty(&LockFileRef { locks })?;
        let path = self.path_for(repository);
        let count = locks.len();

        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| LockStoreError::Task(e.to_string()))??;

        debug!(repository = %repository, count, "persisted lock file");
        Ok(())
    }
}

/// Write `bytes` to `path` through a fsynced temporary file and a rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), LockStoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let io_err = |source| LockStoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(|source| LockStoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    temp.write_all(bytes).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    // Make the rename itself durable.
    #[cfg(unix)]
    std::fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|source| LockStoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    Ok(())
}
