use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{IntakeError, StorageError};

/// Cross-process guard so that only one sync runs per storage root.
///
/// Held for the lifetime of the value; the lock file is removed on drop. A
/// lock left behind by a crashed run must be deleted by hand.
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
}

impl SyncLock {
    pub const FILE_NAME: &'static str = ".sync.lock";

    pub fn acquire(root: &Path) -> Result<Self, IntakeError> {
        std::fs::create_dir_all(root).map_err(|e| StorageError::CreateDirectory {
            path: root.to_path_buf(),
            source: e,
        })?;

        let path = root.join(Self::FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    log::debug!("Could not record pid in {}: {}", path.display(), e);
                }
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(IntakeError::AlreadyRunning(path))
            }
            Err(e) => Err(StorageError::WriteFile { path, source: e }.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}
