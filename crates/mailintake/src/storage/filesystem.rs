use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;

/// A flat directory of files addressed by name.
///
/// Used for both raw `.eml` messages and attachments. Writes overwrite an
/// existing file of the same name (last write wins). Names must already be
/// sanitized; anything that could escape the directory is rejected.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes `content` to `name`, replacing any previous file.
    ///
    /// The handle is flushed before returning, so a successful result means
    /// the bytes reached the OS.
    pub async fn write(&self, name: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        let mut file = self.create(name).await?;
        file.write_chunk(content).await?;
        file.finish().await
    }

    /// Opens `name` for streaming writes, truncating any previous file.
    pub async fn create(&self, name: &str) -> Result<StoredFile, StorageError> {
        let path = self.path_for(name)?;
        self.ensure_directory().await?;

        let file = File::create(&path)
            .await
            .map_err(|e| StorageError::WriteFile {
                path: path.clone(),
                source: e,
            })?;

        Ok(StoredFile { path, file })
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let unsafe_name = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.directory.join(name))
    }

    async fn ensure_directory(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| StorageError::CreateDirectory {
                path: self.directory.clone(),
                source: e,
            })
    }
}

/// A file being written chunk by chunk.
///
/// Call [`StoredFile::finish`] to flush and keep it, or
/// [`StoredFile::discard`] to remove a partial download.
#[derive(Debug)]
pub struct StoredFile {
    path: PathBuf,
    file: File,
}

impl StoredFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| StorageError::WriteFile {
                path: self.path.clone(),
                source: e,
            })
    }

    pub async fn finish(mut self) -> Result<PathBuf, StorageError> {
        let flushed = self.file.flush().await;
        let synced = match flushed {
            Ok(()) => self.file.sync_all().await,
            Err(e) => Err(e),
        };
        synced.map_err(|e| StorageError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(self.path)
    }

    pub async fn discard(self) {
        let StoredFile { path, file } = self;
        drop(file);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to remove partial file {}: {}", path.display(), e);
        }
    }
}
