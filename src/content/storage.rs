use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::fs;

pub const CATS_DIR: &str = "uploads/cats";
pub const ARTICLES_DIR: &str = "uploads/articles";
pub const THUMBNAILS_DIR: &str = "uploads/thumbnails";
pub const TEMP_DIR: &str = "uploads/temp";
pub const RECORDS_DIR: &str = "records";

/// Filesystem adapter rooted at the public content directory. Keys are
/// content-root-relative paths; the same keys resolve to public URLs under
/// `public_prefix`, which is how stored paths stay portable across
/// deployment roots.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
    public_prefix: String,
}

impl ContentStore {
    pub fn new(root: PathBuf, public_prefix: impl Into<String>) -> Self {
        Self {
            root,
            public_prefix: public_prefix.into(),
        }
    }

    /// Create the content directory layout. Called once at startup, after
    /// configuration is resolved.
    pub async fn ensure_layout(&self) -> Result<()> {
        for dir in [CATS_DIR, ARTICLES_DIR, THUMBNAILS_DIR, TEMP_DIR, RECORDS_DIR] {
            fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key);
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a stored object. Missing files are not an error; deletion is
    /// idempotent.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key);
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        let prefix = self.public_prefix.trim_end_matches('/');
        let key = key.trim_start_matches('/');
        format!("{prefix}/{key}")
    }

    pub fn resolve_path(&self, key: &str) -> PathBuf {
        let normalized = key.trim_start_matches('/');
        self.root.join(Path::new(normalized))
    }

    /// Age-based sweep of the temp staging directory. Only files whose
    /// modification time is at least `max_age` old are removed, so the sweep
    /// is safe to run concurrently with in-flight ingestions. Returns the
    /// number of files removed.
    pub async fn sweep_temp(&self, max_age: Duration) -> Result<usize> {
        let dir = self.root.join(TEMP_DIR);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age >= max_age && fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ContentStore {
        ContentStore::new(dir.path().to_path_buf(), "/static")
    }

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.put("uploads/cats/a.jpg", b"bytes").await.unwrap();
        assert_eq!(
            store.get("uploads/cats/a.jpg").await.unwrap().unwrap(),
            b"bytes"
        );
        assert!(store.exists("uploads/cats/a.jpg").await.unwrap());

        assert!(store.remove("uploads/cats/a.jpg").await.unwrap());
        assert!(!store.exists("uploads/cats/a.jpg").await.unwrap());
        assert!(!store.remove("uploads/cats/a.jpg").await.unwrap());
        assert_eq!(store.get("uploads/cats/a.jpg").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ensure_layout_creates_directories() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_layout().await.unwrap();
        for sub in [CATS_DIR, ARTICLES_DIR, THUMBNAILS_DIR, TEMP_DIR, RECORDS_DIR] {
            assert!(dir.path().join(sub).is_dir(), "{sub}");
        }
    }

    #[test]
    fn public_url_joins_prefix_and_key() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(
            store.public_url("uploads/cats/a.jpg"),
            "/static/uploads/cats/a.jpg"
        );
        assert_eq!(store.public_url("/uploads/x.jpg"), "/static/uploads/x.jpg");
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_files() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.put("uploads/temp/stale.jpg", b"x").await.unwrap();
        store.put("uploads/temp/also_stale.png", b"y").await.unwrap();

        // Every file is older than a zero threshold, none older than an hour.
        assert_eq!(store.sweep_temp(Duration::from_secs(3600)).await.unwrap(), 0);
        assert!(store.exists("uploads/temp/stale.jpg").await.unwrap());

        assert_eq!(store.sweep_temp(Duration::ZERO).await.unwrap(), 2);
        assert!(!store.exists("uploads/temp/stale.jpg").await.unwrap());
        assert!(!store.exists("uploads/temp/also_stale.png").await.unwrap());
    }

    #[tokio::test]
    async fn sweep_of_missing_directory_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.sweep_temp(Duration::ZERO).await.unwrap(), 0);
    }
}
