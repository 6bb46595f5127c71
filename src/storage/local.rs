//! Local filesystem storage implementation.
//!
//! Every write goes to a sibling `*.tmp` file, is flushed to disk and then
//! renamed over the target, so a crash mid-write never leaves a truncated
//! document behind.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── notices_data.json                   # Live store document
//! └── notices_backup_1760605200000.json   # Point-in-time backups
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    write_timeout: Duration,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_timeout: Duration::from_secs(10),
        }
    }

    /// Bound every write by `timeout`.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Get the full path for a key. Absolute keys are used as-is.
    pub fn path(&self, key: impl AsRef<Path>) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, sync, then rename).
    ///
    /// The write timeout bounds staging the temp file. The rename only
    /// happens once staging finished in time, so a timed-out write never
    /// replaces the target. A staging write that was cut off may still leave
    /// a `*.tmp` file behind; the next write truncates it.
    pub async fn write_bytes(&self, key: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        let tmp = tmp_path(&path);

        let result = match tokio::time::timeout(self.write_timeout, stage(&path, &tmp, bytes)).await
        {
            Ok(Ok(())) => tokio::fs::rename(&tmp, &path).await.map_err(AppError::Io),
            Ok(Err(e)) => Err(AppError::Io(e)),
            Err(_) => Err(AppError::storage(
                format!("write {}", path.display()),
                format!("timed out after {:?}", self.write_timeout),
            )),
        };

        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result
    }

    /// Write JSON data.
    pub async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: impl AsRef<Path>,
        value: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    pub async fn read_bytes(&self, key: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Whether a key exists on disk.
    pub async fn exists(&self, key: impl AsRef<Path>) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(key)).await?)
    }
}

/// Create the parent directory and write `bytes` to `tmp`, synced to disk.
async fn stage(path: &Path, tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

/// `notices_data.json` -> `notices_data.json.tmp`
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
        assert!(!storage.exists("nope.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_tmp_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_json("doc.json", &vec![1, 2, 3]).await.unwrap();
        storage.write_json("doc.json", &vec![4]).await.unwrap();

        let bytes = storage.read_bytes("doc.json").await.unwrap().unwrap();
        let loaded: Vec<i32> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(loaded, vec![4]);
        assert!(!tmp.path().join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_creates_nested_dirs() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("a/b/c.json", b"{}").await.unwrap();
        assert!(storage.exists("a/b/c.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_timed_out_write_keeps_previous_document() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.write_bytes("doc.json", b"old").await.unwrap();

        let hurried = storage.clone().with_write_timeout(Duration::ZERO);
        let result = hurried.write_bytes("doc.json", b"new").await;
        assert!(matches!(result, Err(AppError::Storage { .. })));

        // Let any staging work still queued on the blocking pool finish.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let data = storage.read_bytes("doc.json").await.unwrap();
        assert_eq!(data, Some(b"old".to_vec()));

        storage.write_bytes("doc.json", b"newer").await.unwrap();
        let data = storage.read_bytes("doc.json").await.unwrap();
        assert_eq!(data, Some(b"newer".to_vec()));
        assert!(!tmp.path().join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_parent_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        std::fs::write(tmp.path().join("blocker"), b"x").unwrap();
        let storage = LocalStorage::new(tmp.path().join("blocker"));

        let result = storage.write_bytes("doc.json", b"{}").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_tmp_path() {
        assert_eq!(
            tmp_path(Path::new("/data/notices_data.json")),
            PathBuf::from("/data/notices_data.json.tmp")
        );
    }
}
