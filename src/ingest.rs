use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::content::storage::{TEMP_DIR, THUMBNAILS_DIR};
use crate::content::{ContentCategory, ContentStore, inline, short_hash};
use crate::error::MediaError;
use crate::image_processing::{self, ProcessedImage};
use crate::validate;

/// Staged temp copies older than this are fair game for the sweep.
pub const TEMP_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// One stored representation of an image. Exactly one variant, so a
/// persisted asset can never end up with neither storage mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Self-describing data-URL string, stored in a database text column.
    Inline(String),
    /// Content-root-relative paths to the two raster variants on disk.
    Files { full: String, thumbnail: String },
}

/// Result of a successful ingestion. `primary` is always the inline
/// representation; `fallback` carries the best-effort filesystem copy for
/// legacy consumers when that branch succeeded.
#[derive(Debug, Clone)]
pub struct IngestedImage {
    pub id: String,
    pub primary: ImageRef,
    pub fallback: Option<ImageRef>,
}

impl IngestedImage {
    pub fn inline_encoded(&self) -> Option<&str> {
        match &self.primary {
            ImageRef::Inline(value) => Some(value),
            ImageRef::Files { .. } => None,
        }
    }

    pub fn stored_path(&self) -> Option<&str> {
        match &self.fallback {
            Some(ImageRef::Files { full, .. }) => Some(full),
            _ => None,
        }
    }

    pub fn thumbnail_path(&self) -> Option<&str> {
        match &self.fallback {
            Some(ImageRef::Files { thumbnail, .. }) => Some(thumbnail),
            _ => None,
        }
    }
}

pub struct IngestService {
    store: ContentStore,
    write_files: bool,
}

impl IngestService {
    pub fn new(store: ContentStore) -> Self {
        Self {
            store,
            write_files: true,
        }
    }

    /// Disable the legacy filesystem branch entirely (ephemeral-disk
    /// deployments that only want the inline representation).
    pub fn with_legacy_files(mut self, enabled: bool) -> Self {
        self.write_files = enabled;
        self
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Validator -> codec -> storage. The inline representation is the
    /// primary result; the filesystem branch is best-effort and its failure
    /// is logged, not surfaced. The staged temp copy of the original upload
    /// is removed on every exit path.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        filename: &str,
        category: ContentCategory,
        name_prefix: Option<&str>,
    ) -> Result<IngestedImage, MediaError> {
        let ext = validate::validate_upload(bytes.len(), filename)?;
        let id = generate_asset_id(category, name_prefix, filename, bytes.len());

        // Stage the original before decoding, like any other branch of the
        // pipeline: best effort, never load-bearing.
        let temp_key = format!("{TEMP_DIR}/{id}_original.{ext}");
        let staged = match self.store.put(&temp_key, bytes).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %temp_key, error = %err, "failed to stage upload in temp dir");
                false
            }
        };

        let processed = image_processing::process(bytes);
        if staged {
            if let Err(err) = self.store.remove(&temp_key).await {
                warn!(key = %temp_key, error = %err, "failed to remove staged temp file");
            }
        }
        let processed = processed?;

        let primary = ImageRef::Inline(inline::encode_jpeg_inline(&processed.full));

        let fallback = if self.write_files {
            match self.write_variants(&id, category, &processed).await {
                Ok(files) => Some(files),
                Err(err) => {
                    warn!(id = %id, error = %err, "filesystem branch failed; keeping inline result");
                    None
                }
            }
        } else {
            None
        };

        debug!(
            id = %id,
            full = ?processed.full_dimensions,
            thumbnail = ?processed.thumbnail_dimensions,
            legacy_files = fallback.is_some(),
            "image ingested"
        );

        Ok(IngestedImage {
            id,
            primary,
            fallback,
        })
    }

    async fn write_variants(
        &self,
        id: &str,
        category: ContentCategory,
        processed: &ProcessedImage,
    ) -> Result<ImageRef, MediaError> {
        let full_key = format!("{}/{id}_full.jpg", category.dir());
        let thumbnail_key = format!("{THUMBNAILS_DIR}/{id}_thumb.jpg");

        self.store
            .put(&full_key, &processed.full)
            .await
            .map_err(MediaError::StorageWriteFailed)?;
        if let Err(err) = self.store.put(&thumbnail_key, &processed.thumbnail).await {
            // Never leave half a file pair behind.
            let _ = self.store.remove(&full_key).await;
            return Err(MediaError::StorageWriteFailed(err));
        }

        Ok(ImageRef::Files {
            full: full_key,
            thumbnail: thumbnail_key,
        })
    }

    pub async fn sweep_temp(&self) -> Result<usize, MediaError> {
        self.store
            .sweep_temp(TEMP_MAX_AGE)
            .await
            .map_err(MediaError::StorageWriteFailed)
    }
}

/// `{prefix}_{timestamp}_{shorthash}`: readable, sortable, and unique
/// enough that concurrent uploads never need locking.
pub fn generate_asset_id(
    category: ContentCategory,
    name_prefix: Option<&str>,
    seed_name: &str,
    payload_len: usize,
) -> String {
    let now = Utc::now();
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let seed = format!(
        "{}:{}:{}:{}",
        category.dir(),
        now.timestamp_nanos_opt().unwrap_or_default(),
        seed_name,
        payload_len
    );
    let prefix = name_prefix
        .map(sanitize_prefix)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| category.default_prefix().to_string());
    format!("{prefix}_{timestamp}_{}", short_hash(&seed))
}

/// Caller-supplied prefixes (cat names) end up in filenames; keep them to a
/// safe alphabet.
fn sanitize_prefix(value: &str) -> String {
    value
        .trim()
        .chars()
        .take(40)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
