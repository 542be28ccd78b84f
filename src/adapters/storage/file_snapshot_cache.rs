//! File-backed Snapshot Cache Adapter
//!
//! Persists the full user record set as a single JSON file on disk.
//! Reads are tolerant: a missing, empty, or malformed file is
//! treated as an empty snapshot so a corrupt cache can never block
//! webhook processing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ports::{CacheError, Snapshot, SnapshotCache};

/// File-backed snapshot cache.
#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    snapshot_path: PathBuf,
}

impl FileSnapshotCache {
    /// Create a cache backed by the given file path.
    ///
    /// # Example
    /// ```ignore
    /// let cache = FileSnapshotCache::new("./data/billing_cache.json");
    /// ```
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Path the snapshot is stored at.
    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    async fn ensure_parent_dir(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotCache for FileSnapshotCache {
    async fn read(&self) -> Snapshot {
        let contents = match fs::read_to_string(&self.snapshot_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Snapshot::new();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.snapshot_path.display(),
                    error = %e,
                    "Failed to read snapshot cache, starting empty"
                );
                return Snapshot::new();
            }
        };

        if contents.trim().is_empty() {
            return Snapshot::new();
        }

        match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    path = %self.snapshot_path.display(),
                    error = %e,
                    "Snapshot cache is malformed, starting empty"
                );
                Snapshot::new()
            }
        }
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(), CacheError> {
        self.ensure_parent_dir().await?;

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| CacheError::Serialize(e.to_string()))?;

        // Write to a sibling temp file then rename so readers never see
        // a half-written snapshot.
        let tmp_path = self.snapshot_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &self.snapshot_path)
            .await
            .map_err(|e| CacheError::Io(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{Platform, UserBillingRecord, UserIdentity};
    use tempfile::TempDir;

    fn test_record(email: &str, premium: bool) -> UserBillingRecord {
        let mut record = UserBillingRecord::new(UserIdentity::email(email));
        record.is_premium = premium;
        record.platform = Platform::Web;
        record
    }

    fn cache_in(dir: &TempDir) -> FileSnapshotCache {
        FileSnapshotCache::new(dir.path().join("billing_cache.json"))
    }

    #[tokio::test]
    async fn test_write_and_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir);

        let mut snapshot = Snapshot::new();
        snapshot.insert("a@example.com".to_string(), test_record("a@example.com", true));
        snapshot.insert("b@example.com".to_string(), test_record("b@example.com", false));

        cache.write(&snapshot).await.unwrap();
        let loaded = cache.read().await;

        assert_eq!(loaded.len(), 2);
        assert!(loaded["a@example.com"].is_premium);
        assert!(!loaded["b@example.com"].is_premium);
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir);

        let snapshot = cache.read().await;

        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir);

        tokio::fs::write(cache.path(), "").await.unwrap();

        let snapshot = cache.read().await;

        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir);

        tokio::fs::write(cache.path(), "{not valid json")
            .await
            .unwrap();

        let snapshot = cache.read().await;

        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileSnapshotCache::new(temp_dir.path().join("nested/dir/cache.json"));

        let mut snapshot = Snapshot::new();
        snapshot.insert("a@example.com".to_string(), test_record("a@example.com", true));

        cache.write(&snapshot).await.unwrap();

        assert_eq!(cache.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_write_replaces_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir);

        let mut first = Snapshot::new();
        first.insert("a@example.com".to_string(), test_record("a@example.com", true));
        first.insert("b@example.com".to_string(), test_record("b@example.com", true));
        cache.write(&first).await.unwrap();

        let mut second = Snapshot::new();
        second.insert("a@example.com".to_string(), test_record("a@example.com", false));
        cache.write(&second).await.unwrap();

        let loaded = cache.read().await;
        assert_eq!(loaded.len(), 1);
        assert!(!loaded["a@example.com"].is_premium);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir);

        cache.write(&Snapshot::new()).await.unwrap();

        assert!(!cache.path().with_extension("json.tmp").exists());
        assert!(cache.path().exists());
    }
}
