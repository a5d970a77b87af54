use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::content::storage::RECORDS_DIR;
use crate::content::{ContentCategory, ContentStore};

/// Persisted description of one ingested image. Stands in for the owning
/// row of the relational store: one record per asset, deleted together with
/// its filesystem artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAssetRecord {
    pub id: String,
    pub source_filename: String,
    pub category: ContentCategory,
    pub stored_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub inline_encoded: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: String,
}

fn record_key(id: &str) -> String {
    format!("{RECORDS_DIR}/{id}.json")
}

/// Record ids double as filenames; anything outside this alphabet is
/// rejected before it can reach the filesystem.
pub fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub async fn save_record(store: &ContentStore, record: &ImageAssetRecord) -> Result<()> {
    anyhow::ensure!(valid_id(&record.id), "invalid record id: {:?}", record.id);
    let payload = serde_json::to_vec_pretty(record)?;
    store.put(&record_key(&record.id), &payload).await?;
    Ok(())
}

pub async fn load_record(store: &ContentStore, id: &str) -> Result<Option<ImageAssetRecord>> {
    if !valid_id(id) {
        return Ok(None);
    }
    let Some(bytes) = store.get(&record_key(id)).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Newest-first listing, optionally filtered by category. Unreadable record
/// files are skipped rather than failing the whole listing.
pub async fn list_records(
    store: &ContentStore,
    category: Option<ContentCategory>,
    limit: usize,
) -> Result<Vec<ImageAssetRecord>> {
    let dir_path = store.resolve_path(RECORDS_DIR);
    let mut dir = match fs::read_dir(&dir_path).await {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut entries: Vec<PathBuf> = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            entries.push(path);
        }
    }
    entries.sort_by(|a, b| b.cmp(a));

    let mut records = Vec::new();
    for path in entries {
        if records.len() >= limit {
            break;
        }
        let bytes = fs::read(&path).await?;
        if let Ok(record) = serde_json::from_slice::<ImageAssetRecord>(&bytes) {
            if let Some(wanted) = category {
                if record.category != wanted {
                    continue;
                }
            }
            records.push(record);
        }
    }
    Ok(records)
}

/// Delete a record and its filesystem artifacts. Files go first so a
/// partial failure leaves the record pointing at whatever still exists.
/// Returns false when no such record was stored.
pub async fn delete_record(store: &ContentStore, id: &str) -> Result<bool> {
    let Some(record) = load_record(store, id).await? else {
        return Ok(false);
    };
    for key in [&record.stored_path, &record.thumbnail_path]
        .into_iter()
        .flatten()
    {
        store.remove(key).await?;
    }
    store.remove(&record_key(id)).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, category: ContentCategory) -> ImageAssetRecord {
        ImageAssetRecord {
            id: id.to_string(),
            source_filename: "misty.png".to_string(),
            category,
            stored_path: Some(format!("uploads/cats/{id}_full.jpg")),
            thumbnail_path: Some(format!("uploads/thumbnails/{id}_thumb.jpg")),
            inline_encoded: Some("data:image/jpeg;base64,aGVsbG8=".to_string()),
            caption: None,
            display_order: 0,
            created_at: "2026-08-04T12:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf(), "/static");

        let original = record("cat_20260804_120000_a1b2c3d4", ContentCategory::Cat);
        save_record(&store, &original).await.unwrap();

        let loaded = load_record(&store, &original.id).await.unwrap().unwrap();
        assert_eq!(loaded.source_filename, "misty.png");
        assert_eq!(loaded.category, ContentCategory::Cat);
        assert_eq!(loaded.stored_path, original.stored_path);
    }

    #[tokio::test]
    async fn listing_filters_by_category() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf(), "/static");

        save_record(&store, &record("cat_1", ContentCategory::Cat))
            .await
            .unwrap();
        save_record(&store, &record("article_1", ContentCategory::Article))
            .await
            .unwrap();

        let cats = list_records(&store, Some(ContentCategory::Cat), 10)
            .await
            .unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].id, "cat_1");

        let all = list_records(&store, None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn delete_cascades_to_stored_files() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf(), "/static");

        let rec = record("cat_gone", ContentCategory::Cat);
        store
            .put(rec.stored_path.as_deref().unwrap(), b"full")
            .await
            .unwrap();
        store
            .put(rec.thumbnail_path.as_deref().unwrap(), b"thumb")
            .await
            .unwrap();
        save_record(&store, &rec).await.unwrap();

        assert!(delete_record(&store, "cat_gone").await.unwrap());
        assert!(!store.exists(rec.stored_path.as_deref().unwrap()).await.unwrap());
        assert!(
            !store
                .exists(rec.thumbnail_path.as_deref().unwrap())
                .await
                .unwrap()
        );
        assert!(load_record(&store, "cat_gone").await.unwrap().is_none());

        assert!(!delete_record(&store, "cat_gone").await.unwrap());
    }

    #[tokio::test]
    async fn traversal_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf(), "/static");
        assert!(load_record(&store, "../etc/passwd").await.unwrap().is_none());
        assert!(!valid_id("a/b"));
        assert!(!valid_id(""));
        assert!(valid_id("cat_20260804_120000_a1b2c3d4"));
    }
}
