use crate::models::{MediaCategory, MediaItem, MediaType};
use crate::services::storage::{BlobStore, LocalBlobStore};
use crate::utils::validation::{mime_type_for, storage_filename};
use chrono::{SubsecRound, Utc};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Unknown category: {0}")]
    InvalidCategory(String),

    #[error("Unknown media type: {0}")]
    InvalidType(String),

    #[error("Media index is corrupt: {0}")]
    CorruptIndex(#[source] serde_json::Error),

    #[error("Failed to serialize media index: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Blobs present on disk without an index entry, and index entries whose
/// blob is gone.
#[derive(Debug, Default)]
pub struct OrphanReport {
    pub unindexed_blobs: Vec<String>,
    pub missing_blobs: Vec<MediaItem>,
}

impl OrphanReport {
    pub fn is_clean(&self) -> bool {
        self.unindexed_blobs.is_empty() && self.missing_blobs.is_empty()
    }
}

/// Category-partitioned blob storage with a JSON metadata index.
///
/// The index file is the source of truth for what exists. Every mutation
/// holds `writer` across its read-modify-write of the index, and the index
/// is replaced atomically, so readers never observe a partial write. Sharing
/// one index between processes is not supported.
pub struct MediaStore {
    blobs: Arc<dyn BlobStore>,
    index_path: PathBuf,
    writer: Mutex<()>,
}

impl MediaStore {
    pub fn new(blobs: Arc<dyn BlobStore>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            blobs,
            index_path: index_path.into(),
            writer: Mutex::new(()),
        }
    }

    /// Store backed by plain files under `media_root`.
    pub fn local(media_root: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalBlobStore::new(media_root)), index_path)
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Creates the category directories and an empty index if none exists.
    /// An existing index is left untouched.
    pub async fn init(&self) -> Result<(), MediaError> {
        for category in MediaCategory::ALL {
            self.blobs.create_dir(category.as_str()).await?;
        }

        if let Some(parent) = self.index_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.index_path)
            .await
        {
            Ok(mut file) => {
                use tokio::io::AsyncWriteExt;
                file.write_all(b"[]").await?;
                info!("Created empty media index at {}", self.index_path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    /// Persists `data` under `category` and appends its record to the index.
    ///
    /// A failure after the blob is written leaves the blob in place without
    /// an index entry.
    pub async fn save_media(
        &self,
        data: &[u8],
        original_name: &str,
        category: MediaCategory,
        media_type: MediaType,
    ) -> Result<MediaItem, MediaError> {
        let _guard = self.writer.lock().await;
        let mut items = self.load_index().await?;

        let id = next_id(&items);
        let filename = storage_filename(&id, original_name);
        let key = blob_key(category, &filename);

        self.blobs.create_dir(category.as_str()).await?;
        self.blobs.write(&key, data).await?;

        let item = MediaItem {
            id,
            media_type,
            url: MediaItem::public_url(category, &filename),
            filename,
            original_name: original_name.to_string(),
            size: data.len() as u64,
            mime_type: mime_type_for(original_name).to_string(),
            category,
            uploaded_at: Utc::now().trunc_subsecs(3),
        };

        items.push(item.clone());
        self.write_index(&items).await?;

        info!(
            id = %item.id,
            category = %category,
            size = item.size,
            "Stored media {}",
            item.filename
        );
        Ok(item)
    }

    /// Every indexed item in insertion order. A missing or unreadable index
    /// lists as empty.
    pub async fn get_media_db(&self) -> Vec<MediaItem> {
        match self.load_index().await {
            Ok(items) => items,
            Err(e) => {
                warn!("Treating media index as empty: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get_media_by_category(&self, category: MediaCategory) -> Vec<MediaItem> {
        self.get_media_db()
            .await
            .into_iter()
            .filter(|item| item.category == category)
            .collect()
    }

    pub async fn get_media(&self, id: &str) -> Option<MediaItem> {
        self.get_media_db()
            .await
            .into_iter()
            .find(|item| item.id == id)
    }

    /// Removes the blob and then the index entry, returning the removed record.
    ///
    /// If the blob cannot be removed, including when it is already gone, the
    /// index is left unchanged. `find_orphans` reports such stale entries.
    pub async fn delete_media(&self, id: &str) -> Result<MediaItem, MediaError> {
        let _guard = self.writer.lock().await;
        let mut items = self.load_index().await?;

        let Some(pos) = items.iter().position(|item| item.id == id) else {
            return Err(MediaError::NotFound(id.to_string()));
        };

        let key = blob_key(items[pos].category, &items[pos].filename);
        if let Err(e) = self.blobs.remove(&key).await {
            error!("Failed to remove blob {}, keeping its index entry: {}", key, e);
            return Err(e.into());
        }

        let removed = items.remove(pos);
        self.write_index(&items).await?;

        info!(id = %removed.id, "Deleted media {}", removed.filename);
        Ok(removed)
    }

    /// Cross-checks the category directories against the index. Read-only.
    pub async fn find_orphans(&self) -> Result<OrphanReport, MediaError> {
        let items = self.load_index().await?;
        let mut report = OrphanReport::default();

        let indexed: HashSet<String> = items
            .iter()
            .map(|item| blob_key(item.category, &item.filename))
            .collect();

        for category in MediaCategory::ALL {
            for name in self.blobs.list(category.as_str()).await? {
                let key = blob_key(category, &name);
                if !indexed.contains(&key) {
                    report.unindexed_blobs.push(key);
                }
            }
        }

        for item in items {
            if !self.blobs.exists(&blob_key(item.category, &item.filename)).await? {
                report.missing_blobs.push(item);
            }
        }

        Ok(report)
    }

    async fn load_index(&self) -> Result<Vec<MediaItem>, MediaError> {
        let raw = match tokio::fs::read_to_string(&self.index_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            if let Some(record) = first_unreadable_record(&raw) {
                warn!("Media index record {} cannot be read", record);
            }
            MediaError::CorruptIndex(e)
        })
    }

    async fn write_index(&self, items: &[MediaItem]) -> Result<(), MediaError> {
        let json = serde_json::to_vec_pretty(items).map_err(MediaError::Serialization)?;
        let path = self.index_path.clone();

        tokio::task::spawn_blocking(move || replace_file(&path, &json))
            .await
            .map_err(io::Error::other)??;
        Ok(())
    }
}

fn blob_key(category: MediaCategory, filename: &str) -> String {
    format!("{}/{}", category, filename)
}

/// Current time in milliseconds, bumped past the largest numeric id already
/// indexed so that ids stay unique and increasing.
fn next_id(items: &[MediaItem]) -> String {
    let now = Utc::now().timestamp_millis();
    let last = items
        .iter()
        .filter_map(|item| item.id.parse::<i64>().ok())
        .max();

    match last {
        Some(last) if last >= now => (last + 1).to_string(),
        _ => now.to_string(),
    }
}

/// Locates the first index entry that does not parse as a `MediaItem`, as
/// `#<position> (id <id>)`. `None` when the file is not a JSON array at all.
fn first_unreadable_record(raw: &str) -> Option<String> {
    let records: Vec<serde_json::Value> = serde_json::from_str(raw).ok()?;
    let (pos, record) = records
        .iter()
        .enumerate()
        .find(|(_, record)| serde_json::from_value::<MediaItem>((*record).clone()).is_err())?;

    let id = record
        .get("id")
        .and_then(|id| id.as_str())
        .unwrap_or("unknown");
    Some(format!("#{} (id {})", pos, id))
}

fn replace_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
