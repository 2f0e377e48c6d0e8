use crate::domain::StoreError;
use crate::ports::ContentStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes downloaded content into one directory.
///
/// The directory is created on the first write. Writing a name twice
/// replaces the earlier file.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    dir: PathBuf,
}

impl FsContentStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "[p2fk-04] Content written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_directory_and_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(tmp.path().join("downloads"));

        let path = store.save("a.bin", b"abc").await.unwrap();
        assert_eq!(path, tmp.path().join("downloads").join("a.bin"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"abc");

        // Overwrite
        store.save("a.bin", b"xy").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"xy");
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        tokio::fs::write(&blocker, b"x").await.unwrap();

        // A regular file where the directory should be
        let store = FsContentStore::new(&blocker);
        assert!(matches!(
            store.save("a.bin", b"abc").await,
            Err(StoreError::Io { .. })
        ));
    }
}
